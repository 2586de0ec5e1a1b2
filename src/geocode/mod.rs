pub mod job;
pub mod provider;
pub mod queue;

pub use job::GeocodeJob;
pub use provider::{GeocodeProvider, HttpGeocodeProvider};
pub use queue::{DispatchScope, GeocodeQueue, GeocodeWorker};

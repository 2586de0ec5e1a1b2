pub mod approval;
pub mod handlers;
pub mod models;
pub mod observer;
pub mod status;
pub mod store;

pub use approval::ApprovalWorkflow;
pub use observer::ReconciliationObserver;
pub use status::StatusService;
pub use store::{MemoryRequestStore, PgRequestStore, RequestStore};

pub mod bases;
pub mod bounds;

pub use bases::{BaseEntry, BaseRegistry};
pub use bounds::RegionBounds;

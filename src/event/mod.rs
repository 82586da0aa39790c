pub mod stats;
pub mod store;
pub mod types;

pub use types::{Event, SourceType};

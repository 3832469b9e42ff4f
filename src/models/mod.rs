pub mod dataset;
pub mod record;

pub use dataset::*;
pub use record::*;

/// Prefix for the placeholder name given to records without one.
pub const UNKNOWN_NAME_PREFIX: &str = "unknown";

//! Logging setup shared by every claimgate binary.

/// Tracing subscriber configuration (filters, JSON formatting).
pub mod tracing;

pub use tracing::{DEFAULT_LEVEL_ENV, init, level_directive};

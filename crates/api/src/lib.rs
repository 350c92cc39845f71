//! HTTP gate: request correlation, claim-set guards and the audited response
//! pipeline.

pub mod app;
pub mod context;
pub mod guard;
pub mod middleware;
pub mod response;

pub use app::build_app;

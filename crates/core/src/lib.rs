//! `claimgate-core`: wire-level building blocks shared by every service.
//!
//! This crate contains **pure** types only (no IO, no HTTP framework).

pub mod envelope;
pub mod error;
pub mod id;

pub use envelope::{ApiResponse, ErrorData, ErrorEnvelope, INTERNAL_ERROR_BODY};
pub use error::ErrorCode;
pub use id::{InvalidRequestId, RequestId};

//! `claimgate-auth`: claim-set authorization (zero-trust).
//!
//! No HTTP and no storage here: this crate reads an
//! already verified token and decides admit/reject.

pub mod authorize;
pub mod claims;
pub mod requirement;
pub mod verifier;

pub use authorize::{AuthError, Guard, PUBLIC_DETAIL, check_exact_claim_set};
pub use claims::{ClaimError, VerifiedToken};
pub use requirement::{ClaimRequirement, HierarchySet};
pub use verifier::{StaticTokenVerifier, TokenVerificationError, TokenVerifier};

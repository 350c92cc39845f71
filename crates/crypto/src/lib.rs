//! `claimgate-crypto`: secret codec for at-rest secrets and passwords.
//!
//! Pure, stateless functions. Key material is handed in raw; reading it from
//! disk is the caller's concern.

pub mod codec;
pub mod random;

pub use codec::{
    CodecError, MAX_HASH_COST, MIN_HASH_COST, decrypt, encrypt, fingerprint, hash, verify,
};
pub use random::{random_numeric, random_token};

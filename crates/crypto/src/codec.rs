//! Symmetric encryption (AES-256-GCM), password hashing (Argon2id) and content
//! fingerprints (SHA-256).
//!
//! ## Ciphertext format
//!
//! `hex( nonce (12 bytes) || ciphertext || tag (16 bytes) )`
//!
//! The nonce is drawn from the OS RNG for every call, so encrypting the same
//! plaintext twice yields different outputs.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// AES-256 key size in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM standard nonce size in bytes.
pub const NONCE_LEN: usize = 12;

/// Lowest accepted Argon2 time cost.
pub const MIN_HASH_COST: u32 = 1;

/// Highest accepted Argon2 time cost.
pub const MAX_HASH_COST: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("encryption key must be {KEY_LEN} bytes (got {len})")]
    InvalidKeyLength { len: usize },

    #[error("hash cost {cost} outside supported range {MIN_HASH_COST}..={MAX_HASH_COST}")]
    InvalidCost { cost: u32 },

    #[error("cannot hash provided string: {0}")]
    Hash(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// Malformed hex, truncated payload, failed authentication or non UTF-8
    /// plaintext; callers cannot tell which.
    #[error("cannot decrypt text")]
    Decrypt,

    #[error("random source unavailable: {0}")]
    Random(String),
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm, CodecError> {
    if key.len() != KEY_LEN {
        return Err(CodecError::InvalidKeyLength { len: key.len() });
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| CodecError::InvalidKeyLength { len: key.len() })
}

/// Hash a secret with Argon2id using `cost` iterations.
///
/// The output is a PHC string embedding algorithm, parameters and salt.
pub fn hash(plaintext: &str, cost: u32) -> Result<String, CodecError> {
    if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) {
        return Err(CodecError::InvalidCost { cost });
    }

    let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
        .map_err(|e| CodecError::Hash(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let salt = SaltString::generate(&mut OsRng);
    let hashed = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| CodecError::Hash(e.to_string()))?
        .to_string();

    tracing::trace!(cost, "hashed secret");
    Ok(hashed)
}

/// Check `plaintext` against a stored hash.
///
/// Returns `false` for a wrong secret and for a malformed hash alike.
pub fn verify(hashed: &str, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hashed) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Encrypt `plaintext` with AES-256-GCM under a 32-byte `key`.
pub fn encrypt(plaintext: &str, key: &[u8]) -> Result<String, CodecError> {
    let cipher = cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| CodecError::Random(e.to_string()))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let sealed = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| CodecError::Encrypt(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&sealed);

    Ok(hex::encode(out))
}

/// Reverse [`encrypt`].
pub fn decrypt(ciphertext_hex: &str, key: &[u8]) -> Result<String, CodecError> {
    let cipher = cipher(key)?;

    let raw = hex::decode(ciphertext_hex).map_err(|_| CodecError::Decrypt)?;
    if raw.len() <= NONCE_LEN {
        return Err(CodecError::Decrypt);
    }

    let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), sealed)
        .map_err(|_| CodecError::Decrypt)?;

    String::from_utf8(plaintext).map_err(|_| CodecError::Decrypt)
}

/// SHA-256 of `input`, lowercase hex. Not for passwords.
pub fn fingerprint(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn encrypt_then_decrypt_returns_plaintext() {
        let sealed = encrypt("db-password", KEY).unwrap();
        assert_eq!(decrypt(&sealed, KEY).unwrap(), "db-password");
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let a = encrypt("same", KEY).unwrap();
        let b = encrypt("same", KEY).unwrap();
        assert_ne!(a, b);
        assert_ne!(a[..NONCE_LEN * 2], b[..NONCE_LEN * 2]);
    }

    #[test]
    fn wrong_key_length_is_rejected_both_ways() {
        assert_eq!(
            encrypt("x", b"short").unwrap_err(),
            CodecError::InvalidKeyLength { len: 5 }
        );
        let sealed = encrypt("x", KEY).unwrap();
        assert_eq!(
            decrypt(&sealed, &KEY[..31]).unwrap_err(),
            CodecError::InvalidKeyLength { len: 31 }
        );
    }

    #[test]
    fn decrypt_failure_causes_share_one_error() {
        assert_eq!(decrypt("not hex!", KEY).unwrap_err(), CodecError::Decrypt);
        assert_eq!(decrypt(&"00".repeat(NONCE_LEN), KEY).unwrap_err(), CodecError::Decrypt);

        let sealed = encrypt("secret", KEY).unwrap();
        let other_key = [7u8; 32];
        assert_eq!(decrypt(&sealed, &other_key).unwrap_err(), CodecError::Decrypt);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let sealed = encrypt("", KEY).unwrap();
        assert_eq!(decrypt(&sealed, KEY).unwrap(), "");
    }

    #[test]
    fn hash_and_verify() {
        let hashed = hash("S3cret!", 2).unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(hashed.contains("t=2"));
        assert!(verify(&hashed, "S3cret!"));
        assert!(!verify(&hashed, "S3cret?"));
    }

    #[test]
    fn verify_never_raises_on_garbage() {
        assert!(!verify("", "anything"));
        assert!(!verify("$argon2id$broken", "anything"));
    }

    #[test]
    fn cost_outside_range_is_rejected() {
        assert_eq!(hash("x", 0).unwrap_err(), CodecError::InvalidCost { cost: 0 });
        assert_eq!(
            hash("x", MAX_HASH_COST + 1).unwrap_err(),
            CodecError::InvalidCost { cost: MAX_HASH_COST + 1 }
        );
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        #[test]
        fn decrypt_inverts_encrypt(plaintext in ".*", key in prop::array::uniform32(any::<u8>())) {
            let sealed = encrypt(&plaintext, &key).unwrap();
            prop_assert_eq!(decrypt(&sealed, &key).unwrap(), plaintext);
        }

        #[test]
        fn any_other_key_length_fails(key in prop::collection::vec(any::<u8>(), 0..64)) {
            prop_assume!(key.len() != KEY_LEN);
            prop_assert_eq!(
                encrypt("payload", &key).unwrap_err(),
                CodecError::InvalidKeyLength { len: key.len() }
            );
        }

        #[test]
        fn tampering_is_detected(plaintext in ".{0,64}", flip in any::<prop::sample::Index>(), bit in 0u8..8) {
            let sealed = encrypt(&plaintext, KEY).unwrap();
            let mut raw = hex::decode(&sealed).unwrap();
            let at = flip.index(raw.len());
            raw[at] ^= 1 << bit;
            prop_assert_eq!(decrypt(&hex::encode(raw), KEY).unwrap_err(), CodecError::Decrypt);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 4,
            ..ProptestConfig::default()
        })]

        #[test]
        fn verify_accepts_only_the_hashed_secret(
            secret in "[ -~]{1,24}",
            other in "[ -~]{1,24}",
            cost in MIN_HASH_COST..=2u32,
        ) {
            let hashed = hash(&secret, cost).unwrap();
            prop_assert!(verify(&hashed, &secret));
            if other != secret {
                prop_assert!(!verify(&hashed, &other));
            }
        }
    }
}

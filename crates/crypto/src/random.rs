//! Random tokens for one-time links and PIN codes.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::CodecError;

/// URL-safe random token of exactly `len` characters.
pub fn random_token(len: usize) -> Result<String, CodecError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CodecError::Random(e.to_string()))?;

    let mut token = URL_SAFE.encode(&bytes);
    token.truncate(len);
    Ok(token)
}

/// Decimal PIN of exactly `len` digits (leading zeros allowed).
pub fn random_numeric(len: usize) -> Result<String, CodecError> {
    let mut pin = String::with_capacity(len);
    let mut buf = [0u8; 32];

    while pin.len() < len {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| CodecError::Random(e.to_string()))?;

        // Rejection sampling keeps the digits uniform.
        for b in buf.iter().filter(|b| **b < 250) {
            if pin.len() == len {
                break;
            }
            pin.push(char::from(b'0' + b % 10));
        }
    }

    Ok(pin)
}

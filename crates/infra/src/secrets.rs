//! File-mounted secrets.

use std::path::{Path, PathBuf};

use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("cannot read secret {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("secret {path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },

    #[error("secret {path} is empty")]
    Empty { path: PathBuf },

    #[error("secret {path} is not an RSA public key")]
    NotRsaPublicKey { path: PathBuf },
}

/// Read a secret file and trim surrounding whitespace.
pub fn read_secret_string(path: impl AsRef<Path>) -> Result<String, SecretError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| SecretError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8(bytes).map_err(|_| SecretError::NotUtf8 {
        path: path.to_path_buf(),
    })?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SecretError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(trimmed.to_string())
}

/// PEM-encoded RSA public key, checked to actually be RSA.
#[derive(Debug, Clone)]
pub struct RsaPublicKeyPem {
    pem: String,
    key: RsaPublicKey,
}

impl RsaPublicKeyPem {
    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub fn key(&self) -> &RsaPublicKey {
        &self.key
    }
}

/// Read a PEM public key (SPKI or PKCS#1). Any other key type is rejected.
pub fn read_rsa_public_key(path: impl AsRef<Path>) -> Result<RsaPublicKeyPem, SecretError> {
    let path = path.as_ref();
    let pem = read_secret_string(path)?;

    let key = RsaPublicKey::from_public_key_pem(&pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(&pem))
        .map_err(|_| SecretError::NotRsaPublicKey {
            path: path.to_path_buf(),
        })?;

    Ok(RsaPublicKeyPem { pem, key })
}

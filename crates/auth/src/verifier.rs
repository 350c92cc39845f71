//! Token verification seam.
//!
//! Signature checking and token parsing live behind [`TokenVerifier`]; the
//! gate only ever sees the resulting [`VerifiedToken`].

use std::collections::HashMap;

use thiserror::Error;

use crate::VerifiedToken;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenVerificationError {
    #[error("missing bearer token")]
    Missing,

    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Turns a raw bearer string into a verified claim set.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, bearer: &str) -> Result<VerifiedToken, TokenVerificationError>;
}

/// Fixed bearer → claims table (tests/dev).
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, VerifiedToken>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, bearer: impl Into<String>, token: VerifiedToken) -> Self {
        self.tokens.insert(bearer.into(), token);
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, bearer: &str) -> Result<VerifiedToken, TokenVerificationError> {
        if bearer.is_empty() {
            return Err(TokenVerificationError::Missing);
        }
        self.tokens
            .get(bearer)
            .cloned()
            .ok_or_else(|| TokenVerificationError::Rejected("unknown token".to_string()))
    }
}

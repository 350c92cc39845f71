//! Request correlation identifier.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Length of a generated request id.
pub const REQUEST_ID_LEN: usize = 24;

/// Per-request correlation id: 24 lowercase hex characters, no hyphens.
///
/// Threaded from the `X-Request-ID` header into every audit event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid request id: {0:?}")]
pub struct InvalidRequestId(pub String);

impl RequestId {
    /// Generate a fresh random id (UUIDv4, hyphens stripped, truncated).
    pub fn generate() -> Self {
        let mut raw = Uuid::new_v4().simple().to_string();
        raw.truncate(REQUEST_ID_LEN);
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RequestId {
    type Err = InvalidRequestId;

    /// Accepts any non-empty, hyphen-free ASCII alphanumeric id (ids may come
    /// from non-HTTP callers with their own generators).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InvalidRequestId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<RequestId> for String {
    fn from(value: RequestId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_24_hex_chars_without_hyphens() {
        let id = RequestId::generate();
        assert_eq!(id.as_str().len(), REQUEST_ID_LEN);
        assert!(!id.as_str().contains('-'));
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }

    #[test]
    fn parse_rejects_hyphens_and_empty() {
        assert!("abc-def".parse::<RequestId>().is_err());
        assert!("".parse::<RequestId>().is_err());
        assert_eq!("abc123".parse::<RequestId>().unwrap().as_str(), "abc123");
    }
}

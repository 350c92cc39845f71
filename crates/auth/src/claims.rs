use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Claim mapping of a token that has already been verified.
///
/// Signature checks happen in whatever verifier produced this value; this type
/// only offers typed reads over the raw claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifiedToken {
    claims: Map<String, Value>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("missing claim '{claim}'")]
    Missing { claim: String },

    #[error("claim '{claim}' is not a {expected}")]
    TypeMismatch { claim: String, expected: &'static str },

    #[error("claim '{claim}' has malformed value {value:?}")]
    Malformed { claim: String, value: String },
}

impl VerifiedToken {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    pub fn from_claims<I, K>(claims: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            claims: claims.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn claim_keys(&self) -> impl Iterator<Item = &str> {
        self.claims.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    fn raw(&self, claim: &str) -> Result<&Value, ClaimError> {
        self.claims.get(claim).ok_or_else(|| ClaimError::Missing {
            claim: claim.to_string(),
        })
    }

    pub fn claim_str(&self, claim: &str) -> Result<&str, ClaimError> {
        match self.raw(claim)? {
            Value::String(s) => Ok(s),
            _ => Err(ClaimError::TypeMismatch {
                claim: claim.to_string(),
                expected: "string",
            }),
        }
    }

    /// Integer claim. Only JSON numbers are accepted; integral floats count.
    pub fn claim_i64(&self, claim: &str) -> Result<i64, ClaimError> {
        let Value::Number(n) = self.raw(claim)? else {
            return Err(ClaimError::TypeMismatch {
                claim: claim.to_string(),
                expected: "number",
            });
        };

        if let Some(i) = n.as_i64() {
            return Ok(i);
        }
        match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => Ok(f as i64),
            _ => Err(ClaimError::Malformed {
                claim: claim.to_string(),
                value: n.to_string(),
            }),
        }
    }

    /// Boolean claim, transported as a string (`"true"`, `"F"`, `"1"`, ...).
    /// A JSON boolean is a type mismatch.
    pub fn claim_bool(&self, claim: &str) -> Result<bool, ClaimError> {
        match self.raw(claim)? {
            Value::String(s) => parse_bool(s).ok_or_else(|| ClaimError::Malformed {
                claim: claim.to_string(),
                value: s.clone(),
            }),
            _ => Err(ClaimError::TypeMismatch {
                claim: claim.to_string(),
                expected: "boolean string",
            }),
        }
    }
}

/// Same spellings other services in the fleet accept for boolean claims.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

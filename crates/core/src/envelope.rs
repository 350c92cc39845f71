//! Standard JSON response envelopes.
//!
//! Success: `{"status": true, "data": <payload>}`
//! Failure: `{"status": false, "data": {"error": {"error_code", "reason", "detail"}}}`

use serde::{Deserialize, Serialize};

use crate::ErrorCode;

/// Caller-facing error description. Never carries internal stack detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error_code: ErrorCode,
    pub reason: String,
    pub detail: String,
}

impl ErrorEnvelope {
    pub fn new(error_code: ErrorCode, reason: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error_code,
            reason: reason.into(),
            detail: detail.into(),
        }
    }
}

/// `data` member of a failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub error: ErrorEnvelope,
}

/// Top-level response body shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { status: true, data }
    }
}

impl ApiResponse<ErrorData> {
    pub fn error(code: ErrorCode, reason: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: false,
            data: ErrorData {
                error: ErrorEnvelope::new(code, reason, detail),
            },
        }
    }

    /// Envelope used when a response body itself could not be produced.
    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::error(ErrorCode::InternalServerError, reason, "internal server error")
    }

    pub fn envelope(&self) -> &ErrorEnvelope {
        &self.data.error
    }
}

/// Pre-rendered body for the case where even the error envelope cannot be
/// serialized.
pub const INTERNAL_ERROR_BODY: &[u8] = br#"{"status":false,"data":{"error":{"error_code":"INTERNAL_SERVER_ERROR","reason":"internal server error","detail":"internal server error"}}}"#;

/// Serialize an envelope, falling back to [`INTERNAL_ERROR_BODY`].
pub fn to_body<T: Serialize>(response: &ApiResponse<T>) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_else(|_| INTERNAL_ERROR_BODY.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::success(json!({"id": "u1"}))).unwrap();
        assert_eq!(body, json!({"status": true, "data": {"id": "u1"}}));
    }

    #[test]
    fn error_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::error(
            ErrorCode::Unauthorized,
            "requires access token",
            "invalid token provided",
        ))
        .unwrap();

        assert_eq!(
            body,
            json!({
                "status": false,
                "data": {"error": {
                    "error_code": "UNAUTHORIZED",
                    "reason": "requires access token",
                    "detail": "invalid token provided",
                }}
            })
        );
    }

    #[test]
    fn fallback_body_is_valid_json() {
        let parsed: ApiResponse<ErrorData> = serde_json::from_slice(INTERNAL_ERROR_BODY).unwrap();
        assert_eq!(parsed.envelope().error_code, ErrorCode::InternalServerError);
    }
}

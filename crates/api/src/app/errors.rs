use axum::http::StatusCode;
use thiserror::Error;

use claimgate_auth::{AuthError, ClaimError, PUBLIC_DETAIL};
use claimgate_core::{ApiResponse, ErrorCode, ErrorData};
use claimgate_crypto::CodecError;

/// Handler-level failure, rendered as the standard error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{reason}: {detail}")]
    BadRequest { reason: String, detail: String },

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error("{reason}: {cause}")]
    Internal { reason: String, cause: String },
}

impl ApiError {
    pub fn bad_request(reason: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
            detail: detail.into(),
        }
    }

    pub fn internal(reason: impl Into<String>, cause: impl ToString) -> Self {
        Self::Internal {
            reason: reason.into(),
            cause: cause.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest { .. } => ErrorCode::BadRequest,
            ApiError::Unauthorized(e) => e.error_code(),
            ApiError::Internal { .. } => ErrorCode::InternalServerError,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code().http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Caller-visible body. Internal causes and claim details stay out of it.
    pub fn envelope(&self) -> ApiResponse<ErrorData> {
        match self {
            ApiError::BadRequest { reason, detail } => {
                ApiResponse::error(ErrorCode::BadRequest, reason, detail)
            }
            ApiError::Unauthorized(_) => {
                ApiResponse::error(ErrorCode::Unauthorized, "unauthorized", PUBLIC_DETAIL)
            }
            ApiError::Internal { reason, .. } => ApiResponse::internal_error(reason),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(value: ClaimError) -> Self {
        ApiError::Unauthorized(AuthError::Claim(value))
    }
}

impl From<CodecError> for ApiError {
    fn from(value: CodecError) -> Self {
        ApiError::internal("cannot process secret", value)
    }
}

//! Request/response bodies for the reference routes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhoAmI {
    pub subject: String,
    pub role: String,
    pub hierarchy: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirstLoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordChanged {
    pub subject: String,
    pub first_login: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyRequest {
    pub recipient: String,
    pub template_id: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotifyAccepted {
    pub queued: bool,
    pub template_id: String,
}

/// Parse a JSON request body, mapping failures onto `BAD_REQUEST`.
pub fn parse_body<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, super::errors::ApiError> {
    serde_json::from_slice(bytes)
        .map_err(|e| super::errors::ApiError::bad_request("invalid request body", e.to_string()))
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use claimgate_events::{NotificationDispatcher, ReplyRoute};

use crate::response::Responder;

/// Argon2 time cost for passwords set through the API.
pub const PASSWORD_HASH_COST: u32 = 2;

#[derive(Debug, Error)]
pub enum PasswordStoreError {
    #[error("password store unavailable: {0}")]
    Unavailable(String),
}

/// Where password hashes (PHC strings) end up once a subject sets one.
///
/// Only ever handed the hash, never the plaintext.
#[async_trait]
pub trait PasswordStore: Send + Sync {
    async fn set_password_hash(&self, subject: &str, phc: String) -> Result<(), PasswordStoreError>;
}

/// Process-local store keyed by subject.
#[derive(Debug, Default)]
pub struct InMemoryPasswordStore {
    hashes: Mutex<HashMap<String, String>>,
}

impl InMemoryPasswordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn password_hash(&self, subject: &str) -> Option<String> {
        self.hashes
            .lock()
            .ok()
            .and_then(|hashes| hashes.get(subject).cloned())
    }
}

#[async_trait]
impl PasswordStore for InMemoryPasswordStore {
    async fn set_password_hash(&self, subject: &str, phc: String) -> Result<(), PasswordStoreError> {
        let mut hashes = self
            .hashes
            .lock()
            .map_err(|_| PasswordStoreError::Unavailable("mutex poisoned".into()))?;
        hashes.insert(subject.to_string(), phc);
        Ok(())
    }
}

/// Shared, read-only state handed to every handler.
pub struct AppServices {
    pub responder: Responder,
    pub notifications: NotificationDispatcher,
    /// Where notification workers acknowledge back to.
    pub reply_to: ReplyRoute,
    pub passwords: Arc<dyn PasswordStore>,
    pub password_hash_cost: u32,
}

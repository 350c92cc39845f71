//! Broker publish primitive (mechanics only).
//!
//! The broker is an exchange/routing-key addressed sink for JSON bytes. This
//! module makes minimal assumptions about it:
//!
//! - **Transport-agnostic**: in-memory, Redis Streams, AMQP, ...
//! - **Best-effort per call**: no retries here; redelivery is the broker's and
//!   the consumers' business
//! - **No ordering guarantees** across publishers; every payload is
//!   self-describing (audit events carry their request id)
//!
//! ## Thread Safety
//!
//! One channel is shared by every request worker of a process, so the trait
//! requires `Send + Sync` and implementations must accept concurrent
//! `publish` calls (either natively or by serializing writes internally).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    #[error("broker rejected message: {0}")]
    Rejected(String),

    #[error("broker write timed out after {0:?}")]
    Timeout(Duration),
}

/// Exchange + routing key (+ bound queue) for one logical destination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrokerRoute {
    pub exchange: String,
    /// Routing key.
    pub key: String,
    #[serde(default)]
    pub queue: String,
}

impl BrokerRoute {
    pub fn new(exchange: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            key: key.into(),
            queue: String::new(),
        }
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }
}

/// Channel-like publish primitive shared across requests.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError>;
}

#[async_trait]
impl<B> BrokerChannel for Arc<B>
where
    B: BrokerChannel + ?Sized,
{
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        (**self).publish(exchange, routing_key, payload).await
    }
}

/// Publish on a detached task, bounded by `limit`.
///
/// The write runs to completion (or timeout) even if the awaiting caller is
/// dropped, e.g. because the HTTP client disconnected.
pub(crate) async fn publish_bounded(
    channel: Arc<dyn BrokerChannel>,
    route: &BrokerRoute,
    payload: Vec<u8>,
    limit: Duration,
) -> Result<(), BrokerError> {
    let exchange = route.exchange.clone();
    let key = route.key.clone();

    let task = tokio::spawn(async move {
        match tokio::time::timeout(limit, channel.publish(&exchange, &key, payload)).await {
            Ok(result) => result,
            Err(_) => Err(BrokerError::Timeout(limit)),
        }
    });

    task.await
        .map_err(|e| BrokerError::Unavailable(format!("publish task aborted: {e}")))?
}

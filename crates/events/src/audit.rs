//! Audit mirroring of outbound responses.
//!
//! Every response a service emits is serialized once; the same bytes are
//! base64-encoded into an [`AuditEvent`] for the monitor exchange and handed
//! back to the HTTP layer to be written to the caller.
//!
//! ## Failure semantics
//!
//! - Response body does not serialize: the caller gets a 500 internal-error
//!   envelope instead, and that envelope is what gets audited.
//! - Broker unreachable / slow: the original status and body are returned
//!   untouched, together with the [`PublishError`] for the caller to log.
//!
//! No retries. At most one broker write per call.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use claimgate_core::{ApiResponse, RequestId, envelope};

use crate::bus::{BrokerChannel, BrokerError, BrokerRoute, publish_bounded};
use crate::envelope::MonitorMessage;

/// Emitter kind used when a context does not override it.
pub const DEFAULT_SOURCE_TYPE: &str = "rest";

/// Upper bound on a single broker write.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("cannot serialize payload: {0}")]
    Serialize(String),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Record mirroring one outbound response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Response body, URL-safe base64.
    #[serde(rename = "response")]
    pub response_payload: String,
    #[serde(rename = "uuid")]
    pub request_id: String,
    pub source: String,
    pub source_type: String,
    pub success: bool,
    #[serde(rename = "status")]
    pub http_status: u16,
    pub endpoint: String,
}

impl AuditEvent {
    /// Decode the mirrored response body.
    pub fn response_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        URL_SAFE.decode(&self.response_payload)
    }
}

/// Per-call correlation data.
///
/// HTTP callers fill it from the request; workers and other non-HTTP callers
/// supply their own id/endpoint and may override the source type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub request_id: RequestId,
    pub endpoint: String,
    pub source_type: Option<String>,
}

impl AuditContext {
    pub fn new(request_id: RequestId, endpoint: impl Into<String>) -> Self {
        Self {
            request_id,
            endpoint: endpoint.into(),
            source_type: None,
        }
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }
}

/// What the HTTP layer should emit after an audit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOutcome {
    pub status: u16,
    /// JSON body to write to the caller.
    pub body: Vec<u8>,
    pub error: Option<PublishError>,
}

impl AuditOutcome {
    pub fn is_published(&self) -> bool {
        self.error.is_none()
    }
}

/// Publishes audit events to the monitor route.
pub struct AuditPublisher {
    channel: Arc<dyn BrokerChannel>,
    route: BrokerRoute,
    source: String,
    source_type: String,
    publish_timeout: Duration,
}

impl core::fmt::Debug for AuditPublisher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuditPublisher")
            .field("route", &self.route)
            .field("source", &self.source)
            .field("source_type", &self.source_type)
            .field("publish_timeout", &self.publish_timeout)
            .finish_non_exhaustive()
    }
}

impl AuditPublisher {
    pub fn new(channel: Arc<dyn BrokerChannel>, route: BrokerRoute, source: impl Into<String>) -> Self {
        Self {
            channel,
            route,
            source: source.into(),
            source_type: DEFAULT_SOURCE_TYPE.to_string(),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = source_type.into();
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn route(&self) -> &BrokerRoute {
        &self.route
    }

    /// Serialize `body`, mirror it to the monitor and return what to emit.
    pub async fn publish<T>(&self, body: &T, status: u16, ctx: &AuditContext) -> AuditOutcome
    where
        T: Serialize + ?Sized,
    {
        let bytes = match serde_json::to_vec(body) {
            Ok(bytes) => bytes,
            Err(e) => return self.unserializable(e, ctx).await,
        };

        let error = self.mirror(&bytes, status, ctx).await.err();
        AuditOutcome {
            status,
            body: bytes,
            error,
        }
    }

    /// Like [`publish`](Self::publish), but audits `audited` while the caller
    /// receives `caller`. Used where the audit trail needs detail the caller
    /// must not see.
    pub async fn publish_redacted<C, A>(
        &self,
        caller: &C,
        audited: &A,
        status: u16,
        ctx: &AuditContext,
    ) -> AuditOutcome
    where
        C: Serialize + ?Sized,
        A: Serialize + ?Sized,
    {
        let bytes = match serde_json::to_vec(caller) {
            Ok(bytes) => bytes,
            Err(e) => return self.unserializable(e, ctx).await,
        };

        // Falls back to the caller body so the response is still audited once.
        let error = match serde_json::to_vec(audited) {
            Ok(audit_bytes) => self.mirror(&audit_bytes, status, ctx).await.err(),
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    error = %e,
                    "cannot serialize audited body, mirroring caller body"
                );
                self.mirror(&bytes, status, ctx)
                    .await
                    .err()
                    .or(Some(PublishError::Serialize(e.to_string())))
            }
        };

        AuditOutcome {
            status,
            body: bytes,
            error,
        }
    }

    async fn unserializable(&self, cause: serde_json::Error, ctx: &AuditContext) -> AuditOutcome {
        tracing::error!(
            request_id = %ctx.request_id,
            endpoint = %ctx.endpoint,
            error = %cause,
            "cannot serialize response body"
        );

        let body = envelope::to_body(&ApiResponse::internal_error("cannot marshal response"));
        if let Err(e) = self.mirror(&body, 500, ctx).await {
            tracing::warn!(request_id = %ctx.request_id, error = %e, "cannot mirror internal error");
        }

        AuditOutcome {
            status: 500,
            body,
            error: Some(PublishError::Serialize(cause.to_string())),
        }
    }

    async fn mirror(&self, body: &[u8], status: u16, ctx: &AuditContext) -> Result<(), PublishError> {
        let event = AuditEvent {
            response_payload: URL_SAFE.encode(body),
            request_id: ctx.request_id.to_string(),
            source: self.source.clone(),
            source_type: ctx
                .source_type
                .clone()
                .unwrap_or_else(|| self.source_type.clone()),
            success: status == 200,
            http_status: status,
            endpoint: ctx.endpoint.clone(),
        };

        let payload = serde_json::to_vec(&MonitorMessage::new(event))
            .map_err(|e| PublishError::Serialize(e.to_string()))?;

        publish_bounded(self.channel.clone(), &self.route, payload, self.publish_timeout).await?;

        tracing::trace!(request_id = %ctx.request_id, status, "audit event published");
        Ok(())
    }
}

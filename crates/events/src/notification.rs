//! Fire-and-forget notification requests (email/SMS workers).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audit::{DEFAULT_PUBLISH_TIMEOUT, PublishError};
use crate::bus::{BrokerChannel, BrokerRoute, publish_bounded};
use crate::envelope::NotificationMessage;

/// Where the notification worker acknowledges back to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplyRoute {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
}

impl From<&BrokerRoute> for ReplyRoute {
    fn from(route: &BrokerRoute) -> Self {
        Self {
            exchange: route.exchange.clone(),
            queue: route.queue.clone(),
            routing_key: route.key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub recipient: String,
    pub template_id: String,
    /// Positional template parameters; order is significant.
    #[serde(default)]
    pub parameters: Vec<String>,
    pub reply_to: ReplyRoute,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationEnvelope {
    pub fn new(
        recipient: impl Into<String>,
        template_id: impl Into<String>,
        reply_to: ReplyRoute,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            template_id: template_id.into(),
            parameters: Vec::new(),
            reply_to,
            user_id: user_id.into(),
            error: None,
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters.extend(parameters.into_iter().map(Into::into));
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Result of a dispatch. `status`/`response` are whatever the caller passed
/// in; they say nothing about delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome<R> {
    pub status: u16,
    pub response: R,
    pub error: Option<PublishError>,
}

pub struct NotificationDispatcher {
    channel: Arc<dyn BrokerChannel>,
    route: BrokerRoute,
    publish_timeout: Duration,
}

impl core::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("route", &self.route)
            .field("publish_timeout", &self.publish_timeout)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn BrokerChannel>, route: BrokerRoute) -> Self {
        Self {
            channel,
            route,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub async fn dispatch<R>(
        &self,
        envelope: &NotificationEnvelope,
        status: u16,
        response: R,
    ) -> DispatchOutcome<R> {
        let error = match self.send(envelope).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    template_id = %envelope.template_id,
                    exchange = %self.route.exchange,
                    error = %e,
                    "notification dispatch failed"
                );
                Some(e)
            }
        };

        DispatchOutcome {
            status,
            response,
            error,
        }
    }

    async fn send(&self, envelope: &NotificationEnvelope) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(&NotificationMessage::new(envelope.clone()))
            .map_err(|e| PublishError::Serialize(e.to_string()))?;
        publish_bounded(self.channel.clone(), &self.route, payload, self.publish_timeout).await?;
        Ok(())
    }
}

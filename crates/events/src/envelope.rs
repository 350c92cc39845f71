//! Wire envelopes for broker payloads.
//!
//! Monitor and notification workers consume `{"data": {"<kind>": {...}}}`;
//! these wrappers keep that framing out of the domain types.

use serde::{Deserialize, Serialize};

use crate::audit::AuditEvent;
use crate::notification::NotificationEnvelope;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorMessage {
    pub data: MonitorData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorData {
    pub monitor: AuditEvent,
}

impl MonitorMessage {
    pub fn new(monitor: AuditEvent) -> Self {
        Self {
            data: MonitorData { monitor },
        }
    }

    pub fn into_event(self) -> AuditEvent {
        self.data.monitor
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub notification: NotificationEnvelope,
}

impl NotificationMessage {
    pub fn new(notification: NotificationEnvelope) -> Self {
        Self {
            data: NotificationData { notification },
        }
    }

    pub fn into_envelope(self) -> NotificationEnvelope {
        self.data.notification
    }
}

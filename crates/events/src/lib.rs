//! Broker-facing side channels: audit mirroring and notification dispatch.

pub mod audit;
pub mod bus;
pub mod envelope;
pub mod in_memory_bus;
pub mod notification;

pub use audit::{AuditContext, AuditEvent, AuditOutcome, AuditPublisher, PublishError};
pub use bus::{BrokerChannel, BrokerError, BrokerRoute};
pub use envelope::{MonitorMessage, NotificationMessage};
pub use in_memory_bus::{InMemoryBroker, PublishedMessage, Subscription};
pub use notification::{DispatchOutcome, NotificationDispatcher, NotificationEnvelope, ReplyRoute};

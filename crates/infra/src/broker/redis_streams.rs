//! Redis Streams-backed broker channel.
//!
//! Each (exchange, routing key) pair maps onto one stream:
//!
//! - **Stream key**: `<exchange>:<routing_key>` (e.g. `monitor:monitor.events`)
//! - **Entry fields**: `exchange`, `routing_key`, `payload` (the JSON bytes)
//! - **Trimming**: optional approximate `MAXLEN` per stream
//!
//! Consumers (monitor/notification workers) read the streams with their own
//! consumer groups; nothing here reads back.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::instrument;

use claimgate_events::{BrokerChannel, BrokerError};

#[derive(Debug, thiserror::Error)]
pub enum RedisStreamsError {
    #[error("redis connection error: {0}")]
    Connection(String),

    #[error("redis command error: {0}")]
    Command(String),
}

impl From<RedisStreamsError> for BrokerError {
    fn from(value: RedisStreamsError) -> Self {
        match value {
            RedisStreamsError::Connection(e) => BrokerError::Unavailable(e),
            RedisStreamsError::Command(e) => BrokerError::Rejected(e),
        }
    }
}

/// Stream key for one route.
pub fn stream_key(exchange: &str, routing_key: &str) -> String {
    format!("{exchange}:{routing_key}")
}

#[derive(Clone)]
pub struct RedisStreamsBroker {
    conn: ConnectionManager,
    max_len: Option<usize>,
}

impl core::fmt::Debug for RedisStreamsBroker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisStreamsBroker")
            .field("max_len", &self.max_len)
            .finish_non_exhaustive()
    }
}

impl RedisStreamsBroker {
    /// Connect to `redis_url` (e.g. `redis://localhost:6379`).
    ///
    /// The connection manager reconnects on its own; one instance is shared
    /// by every request.
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, RedisStreamsError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RedisStreamsError::Connection(e.to_string()))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| RedisStreamsError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            max_len: None,
        })
    }

    /// Cap each stream at roughly `max_len` entries.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    fn xadd(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> redis::Cmd {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(stream_key(exchange, routing_key));
        if let Some(max_len) = self.max_len {
            cmd.arg("MAXLEN").arg("~").arg(max_len);
        }
        cmd.arg("*")
            .arg("exchange")
            .arg(exchange)
            .arg("routing_key")
            .arg(routing_key)
            .arg("payload")
            .arg(payload);
        cmd
    }
}

#[async_trait]
impl BrokerChannel for RedisStreamsBroker {
    #[instrument(skip(self, payload), fields(bytes = payload.len()), err)]
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();

        let _: String = self
            .xadd(exchange, routing_key, &payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                let err = if e.is_io_error() || e.is_connection_dropped() {
                    RedisStreamsError::Connection(e.to_string())
                } else {
                    RedisStreamsError::Command(format!("XADD failed: {e}"))
                };
                BrokerError::from(err)
            })?;

        Ok(())
    }
}

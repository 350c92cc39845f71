//! Broker channel implementations backed by real infrastructure.
//!
//! The `BrokerChannel` seam and the in-memory channel live in
//! `claimgate-events`; this module only adds networked transports.

#[cfg(feature = "redis")]
pub mod redis_streams;

#[cfg(feature = "redis")]
pub use redis_streams::{RedisStreamsBroker, RedisStreamsError};

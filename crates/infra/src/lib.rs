//! Infrastructure layer: configuration, secrets, token verification, brokers.

pub mod broker;
pub mod config;
pub mod secrets;
pub mod token;

pub use config::{ConfigError, ServiceConfig};
pub use secrets::{RsaPublicKeyPem, SecretError, read_rsa_public_key, read_secret_string};
pub use token::JwtTokenVerifier;

#[cfg(feature = "redis")]
pub use broker::{RedisStreamsBroker, RedisStreamsError};

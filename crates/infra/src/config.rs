//! Service configuration.
//!
//! Loading order:
//! 1. YAML file named by the given environment variable
//! 2. `CLAIMGATE__<SECTION>__<KEY>` environment overrides
//!
//! The result is validated once at startup and then shared read-only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use claimgate_auth::{ClaimRequirement, HierarchySet};
use claimgate_events::BrokerRoute;
use claimgate_events::audit::{DEFAULT_PUBLISH_TIMEOUT, DEFAULT_SOURCE_TYPE};

pub const CONFIG_PATH_ENV: &str = "CLAIMGATE_CONFIG";
pub const ENV_PREFIX: &str = "CLAIMGATE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("cannot load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub application: ApplicationConfig,
    pub infrastructure: InfrastructureConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    pub name: String,
    /// Emitting service name stamped on audit events.
    pub source: String,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub cors_policy: CorsPolicy,
    #[serde(default)]
    pub hierarchies: HierarchySet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub kid: Option<String>,
    pub audience: String,
    pub issuer: String,
    pub public_key_filepath: PathBuf,
    pub access_token: TokenPolicy,
    pub refresh_token: TokenPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPolicy {
    pub claims: ClaimRequirement,
    #[serde(default)]
    pub expiry_minutes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsPolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfrastructureConfig {
    pub microservice: MicroserviceConfig,
    pub broker: BrokerConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MicroserviceConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    pub url: String,
    pub monitor: BrokerRoute,
    pub notification: BrokerRoute,
    #[serde(default)]
    pub producer: BrokerRoute,
    #[serde(default)]
    pub consumer: BrokerRoute,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
    #[serde(default = "default_source_type")]
    pub source_type: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            publish_timeout_ms: default_publish_timeout_ms(),
            source_type: default_source_type(),
        }
    }
}

impl AuditConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

fn default_publish_timeout_ms() -> u64 {
    DEFAULT_PUBLISH_TIMEOUT.as_millis() as u64
}

fn default_source_type() -> String {
    DEFAULT_SOURCE_TYPE.to_string()
}

impl ServiceConfig {
    /// Load from the file named by `path_env`, then apply env overrides.
    pub fn load_from_env(path_env: &str) -> Result<Self, ConfigError> {
        let path = std::env::var(path_env).map_err(|_| ConfigError::MissingEnv(path_env.to_string()))?;
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Yaml))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse YAML text directly (no env overrides).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let jwt = &self.application.jwt;
        if jwt.access_token.claims.is_empty() {
            return Err(ConfigError::Invalid(
                "application.jwt.access_token.claims must not be empty".into(),
            ));
        }
        if jwt.refresh_token.claims.is_empty() {
            return Err(ConfigError::Invalid(
                "application.jwt.refresh_token.claims must not be empty".into(),
            ));
        }

        let broker = &self.infrastructure.broker;
        for (name, route) in [("monitor", &broker.monitor), ("notification", &broker.notification)] {
            if route.exchange.is_empty() || route.key.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "infrastructure.broker.{name} needs both exchange and key"
                )));
            }
        }

        if self.infrastructure.audit.publish_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "infrastructure.audit.publish_timeout_ms must be positive".into(),
            ));
        }

        Ok(())
    }
}

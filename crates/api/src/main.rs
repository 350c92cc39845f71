use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use claimgate_api::app::services::InMemoryPasswordStore;
use claimgate_events::BrokerChannel;
use claimgate_infra::config::CONFIG_PATH_ENV;
use claimgate_infra::{JwtTokenVerifier, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    claimgate_observability::init(claimgate_observability::DEFAULT_LEVEL_ENV);

    let config = ServiceConfig::load_from_env(CONFIG_PATH_ENV)?;
    let verifier = Arc::new(JwtTokenVerifier::from_config(&config.application.jwt)?);
    let channel = broker_channel(&config).await?;

    tracing::warn!("password hashes are kept in process memory");
    let passwords = Arc::new(InMemoryPasswordStore::new());

    let app = claimgate_api::build_app(&config, verifier, channel, passwords);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.infrastructure.microservice.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, service = %config.application.name, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

#[cfg(feature = "redis")]
async fn broker_channel(config: &ServiceConfig) -> anyhow::Result<Arc<dyn BrokerChannel>> {
    let broker = claimgate_infra::RedisStreamsBroker::connect(&config.infrastructure.broker.url)
        .await
        .context("cannot reach broker")?;
    Ok(Arc::new(broker))
}

#[cfg(not(feature = "redis"))]
async fn broker_channel(_config: &ServiceConfig) -> anyhow::Result<Arc<dyn BrokerChannel>> {
    tracing::warn!("redis feature disabled; audit events stay in process memory");
    Ok(Arc::new(claimgate_events::InMemoryBroker::new()))
}

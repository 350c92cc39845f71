//! HTTP application wiring (axum router + shared services).
//!
//! - `services.rs`: state shared by handlers
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: handler errors → error envelope

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use claimgate_auth::TokenVerifier;
use claimgate_events::{AuditPublisher, BrokerChannel, NotificationDispatcher, ReplyRoute};
use claimgate_infra::ServiceConfig;
use claimgate_infra::config::CorsPolicy;

use crate::guard::Gate;
use crate::middleware::{self, REQUEST_ID_HEADER, TokenState};
use crate::response::Responder;
use services::PasswordStore;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(
    config: &ServiceConfig,
    verifier: Arc<dyn TokenVerifier>,
    channel: Arc<dyn BrokerChannel>,
    passwords: Arc<dyn PasswordStore>,
) -> Router {
    let infra = &config.infrastructure;

    let publisher = Arc::new(
        AuditPublisher::new(channel.clone(), infra.broker.monitor.clone(), &config.application.source)
            .with_source_type(&infra.audit.source_type)
            .with_publish_timeout(infra.audit.publish_timeout()),
    );

    let notifications = NotificationDispatcher::new(channel, infra.broker.notification.clone())
        .with_publish_timeout(infra.audit.publish_timeout());

    let services = Arc::new(services::AppServices {
        responder: Responder::new(publisher.clone()),
        notifications,
        reply_to: ReplyRoute::from(&infra.broker.consumer),
        passwords,
        password_hash_cost: services::PASSWORD_HASH_COST,
    });

    let gate = Gate::new(publisher, config.application.jwt.refresh_token.claims.clone());

    let guarded = routes::router(config, &gate)
        .layer(Extension(services))
        .layer(from_fn_with_state(
            TokenState { verifier },
            middleware::token_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(guarded)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(cors_layer(&config.application.cors_policy))
}

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    if !policy.enabled {
        return CorsLayer::new();
    }

    let origins = if policy.allowed_domains.iter().any(|d| d == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            policy
                .allowed_domains
                .iter()
                .filter_map(|d| HeaderValue::from_str(d).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([REQUEST_ID_HEADER.clone()])
}

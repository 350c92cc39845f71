use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use claimgate_infra::ServiceConfig;

use crate::guard::{Gate, guard_middleware};

pub mod notify;
pub mod password;
pub mod system;
pub mod token;

/// Guarded routes. The last `route_layer` added runs first.
pub fn router(config: &ServiceConfig, gate: &Gate) -> Router {
    let access = gate.access_token(config.application.jwt.access_token.claims.clone());

    let whoami = Router::new()
        .route("/whoami", get(system::whoami))
        .route_layer(from_fn_with_state(
            gate.hierarchy(config.application.hierarchies.clone()),
            guard_middleware,
        ))
        .route_layer(from_fn_with_state(access.clone(), guard_middleware));

    let refresh = Router::new()
        .route("/token/refresh", post(token::refresh))
        .route_layer(from_fn_with_state(gate.refresh_token(), guard_middleware));

    let first_login = Router::new()
        .route("/password/first-login", post(password::first_login))
        .route_layer(from_fn_with_state(gate.first_login(true), guard_middleware));

    let notify = Router::new()
        .route("/notify", post(notify::notify))
        .route_layer(from_fn_with_state(access, guard_middleware));

    Router::new()
        .merge(whoami)
        .merge(refresh)
        .merge(first_login)
        .merge(notify)
}

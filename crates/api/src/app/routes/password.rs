use std::sync::Arc;

use axum::{body::Bytes, extract::Extension, response::Response};

use claimgate_auth::VerifiedToken;

use crate::app::dto::{FirstLoginRequest, PasswordChanged, parse_body};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Set the initial password. Only reachable while `first_login` is true.
pub async fn first_login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(token): Extension<VerifiedToken>,
    body: Bytes,
) -> Response {
    let result = set_password(&services, &token, &body).await;
    services.responder.respond_result(&ctx, result).await
}

async fn set_password(
    services: &AppServices,
    token: &VerifiedToken,
    body: &[u8],
) -> Result<PasswordChanged, ApiError> {
    let subject = token.claim_str("sub")?.to_string();
    let req: FirstLoginRequest = parse_body(body)?;

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            "invalid password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    // Argon2 is CPU-bound; keep it off the async workers.
    let cost = services.password_hash_cost;
    let hashed = tokio::task::spawn_blocking(move || claimgate_crypto::hash(&req.password, cost))
        .await
        .map_err(|e| ApiError::internal("cannot hash password", e))??;

    services
        .passwords
        .set_password_hash(&subject, hashed)
        .await
        .map_err(|e| ApiError::internal("cannot store password", e))?;

    tracing::info!(%subject, "initial password set");

    Ok(PasswordChanged {
        subject,
        first_login: false,
    })
}

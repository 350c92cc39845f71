use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response};

use claimgate_auth::VerifiedToken;
use claimgate_auth::authorize::{HIERARCHY_CLAIM, ROLE_CLAIM};

use crate::app::dto::WhoAmI;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(token): Extension<VerifiedToken>,
) -> Response {
    services.responder.respond_result(&ctx, describe(&token)).await
}

fn describe(token: &VerifiedToken) -> Result<WhoAmI, ApiError> {
    Ok(WhoAmI {
        subject: token.claim_str("sub")?.to_string(),
        role: token.claim_str(ROLE_CLAIM)?.to_string(),
        hierarchy: token.claim_i64(HIERARCHY_CLAIM)?,
    })
}

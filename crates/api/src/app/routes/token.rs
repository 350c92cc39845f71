use std::sync::Arc;

use axum::{extract::Extension, response::Response};

use claimgate_auth::VerifiedToken;

use crate::app::dto::Subject;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestContext;

/// Echo the subject of a valid refresh token. Issuing the new pair is the
/// identity service's job.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(token): Extension<VerifiedToken>,
) -> Response {
    let result = token
        .claim_str("sub")
        .map(|sub| Subject {
            subject: sub.to_string(),
        })
        .map_err(ApiError::from);

    services.responder.respond_result(&ctx, result).await
}

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::Response,
};

use claimgate_auth::VerifiedToken;
use claimgate_core::ApiResponse;
use claimgate_events::NotificationEnvelope;

use crate::app::dto::{NotifyAccepted, NotifyRequest, parse_body};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestContext;

/// Queue a templated notification for the caller. Fire-and-forget: a broker
/// failure is logged but the request still succeeds.
pub async fn notify(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(token): Extension<VerifiedToken>,
    body: Bytes,
) -> Response {
    let envelope = match build_envelope(&services, &token, &body) {
        Ok(envelope) => envelope,
        Err(err) => return services.responder.respond_result::<NotifyAccepted>(&ctx, Err(err)).await,
    };

    let accepted = NotifyAccepted {
        queued: true,
        template_id: envelope.template_id.clone(),
    };
    let outcome = services
        .notifications
        .dispatch(&envelope, StatusCode::OK.as_u16(), accepted)
        .await;

    if outcome.error.is_some() {
        tracing::warn!(request_id = %ctx.request_id(), "notification not handed to broker");
    }

    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::OK);
    services
        .responder
        .respond(&ctx, status, &ApiResponse::success(outcome.response))
        .await
}

fn build_envelope(
    services: &AppServices,
    token: &VerifiedToken,
    body: &[u8],
) -> Result<NotificationEnvelope, ApiError> {
    let user_id = token.claim_str("sub")?;
    let req: NotifyRequest = parse_body(body)?;

    if req.recipient.trim().is_empty() || req.template_id.trim().is_empty() {
        return Err(ApiError::bad_request(
            "invalid notification",
            "recipient and template_id are required",
        ));
    }

    Ok(
        NotificationEnvelope::new(req.recipient, req.template_id, services.reply_to.clone(), user_id)
            .with_parameters(req.parameters),
    )
}

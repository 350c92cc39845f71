//! Response pipeline: every handler outcome leaves through here.
//!
//! One audit attempt per response, awaited before the response is returned to
//! axum. Audit failures are logged with the request id; the caller only sees a
//! different response when the original payload could not be serialized.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Serialize;

use claimgate_core::ApiResponse;
use claimgate_events::{AuditOutcome, AuditPublisher};

use crate::app::errors::ApiError;
use crate::context::RequestContext;

#[derive(Clone)]
pub struct Responder {
    publisher: Arc<AuditPublisher>,
}

impl Responder {
    pub fn new(publisher: Arc<AuditPublisher>) -> Self {
        Self { publisher }
    }

    pub fn publisher(&self) -> &Arc<AuditPublisher> {
        &self.publisher
    }

    pub async fn respond<T>(&self, ctx: &RequestContext, status: StatusCode, body: &ApiResponse<T>) -> Response
    where
        T: Serialize,
    {
        let outcome = self.publisher.publish(body, status.as_u16(), &ctx.audit()).await;
        finish(ctx, outcome)
    }

    pub async fn respond_result<T>(&self, ctx: &RequestContext, result: Result<T, ApiError>) -> Response
    where
        T: Serialize,
    {
        match result {
            Ok(data) => self.respond(ctx, StatusCode::OK, &ApiResponse::success(data)).await,
            Err(err) => {
                if matches!(err, ApiError::Internal { .. }) {
                    tracing::error!(request_id = %ctx.request_id(), error = %err, "request failed");
                } else {
                    tracing::info!(request_id = %ctx.request_id(), error = %err, "request rejected");
                }
                self.respond(ctx, err.status(), &err.envelope()).await
            }
        }
    }
}

/// Log any audit failure and turn the outcome into the HTTP response.
pub(crate) fn finish(ctx: &RequestContext, outcome: AuditOutcome) -> Response {
    if let Some(err) = &outcome.error {
        tracing::error!(
            request_id = %ctx.request_id(),
            endpoint = %ctx.endpoint(),
            status = outcome.status,
            error = %err,
            "audit publish failed"
        );
    }

    json_response(outcome.status, outcome.body)
}

fn json_response(status: u16, body: Vec<u8>) -> Response {
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    res
}

//! Route guards: claim-set authorization as axum middleware.
//!
//! Guards run after `token_middleware` and before the handler. A rejection
//! short-circuits with 401; the caller gets a fixed detail while the audit
//! event carries the real cause.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use claimgate_auth::{ClaimRequirement, Guard, HierarchySet, PUBLIC_DETAIL, VerifiedToken};
use claimgate_core::{ApiResponse, ErrorCode};
use claimgate_events::AuditPublisher;

use crate::context::RequestContext;
use crate::response;

/// One configured guard plus the publisher its rejections are audited through.
#[derive(Clone)]
pub struct GuardState {
    guard: Arc<Guard>,
    publisher: Arc<AuditPublisher>,
}

impl GuardState {
    pub fn guard(&self) -> &Guard {
        &self.guard
    }
}

/// Builds [`GuardState`]s for routes, sharing one publisher.
#[derive(Clone)]
pub struct Gate {
    publisher: Arc<AuditPublisher>,
    refresh_claims: ClaimRequirement,
}

impl Gate {
    pub fn new(publisher: Arc<AuditPublisher>, refresh_claims: ClaimRequirement) -> Self {
        Self {
            publisher,
            refresh_claims,
        }
    }

    fn state(&self, guard: Guard) -> GuardState {
        GuardState {
            guard: Arc::new(guard),
            publisher: self.publisher.clone(),
        }
    }

    pub fn access_token(&self, claims: ClaimRequirement) -> GuardState {
        self.state(Guard::AccessToken(claims))
    }

    pub fn refresh_token(&self) -> GuardState {
        self.state(Guard::RefreshToken(self.refresh_claims.clone()))
    }

    pub fn hierarchy(&self, levels: HierarchySet) -> GuardState {
        self.state(Guard::Hierarchy(levels))
    }

    pub fn first_login(&self, expected: bool) -> GuardState {
        self.state(Guard::FirstLogin(expected))
    }
}

pub async fn guard_middleware(
    State(state): State<GuardState>,
    req: Request,
    next: Next,
) -> Response {
    let verdict = state.guard.check(req.extensions().get::<VerifiedToken>());

    let Err(err) = verdict else {
        return next.run(req).await;
    };

    let ctx = req
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| RequestContext::for_uri(req.uri()));

    let reason = state.guard.reason();
    tracing::warn!(
        request_id = %ctx.request_id(),
        endpoint = %ctx.endpoint(),
        reason,
        error = %err,
        "request rejected by guard"
    );

    let caller = ApiResponse::error(ErrorCode::Unauthorized, reason, PUBLIC_DETAIL);
    let audited = ApiResponse::error(ErrorCode::Unauthorized, reason, err.to_string());

    let outcome = state
        .publisher
        .publish_redacted(
            &caller,
            &audited,
            StatusCode::UNAUTHORIZED.as_u16(),
            &ctx.audit(),
        )
        .await;

    response::finish(&ctx, outcome)
}

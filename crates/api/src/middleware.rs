use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, Span, field};

use claimgate_auth::authorize::{HIERARCHY_CLAIM, ROLE_CLAIM};
use claimgate_auth::{TokenVerificationError, TokenVerifier, VerifiedToken};

use crate::context::RequestContext;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

static FORWARDED_FOR_HEADER: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Assign a request id, expose it to handlers and echo it to the caller.
///
/// Everything downstream runs inside a `request` span carrying the id, the
/// client addresses and, once `token_middleware` has verified a token, the
/// caller's identity claims.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext::for_uri(req.uri());
    let header = HeaderValue::from_str(ctx.request_id().as_str()).ok();

    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id(),
        endpoint = %ctx.endpoint(),
        ips = ?client_ips(&req),
        actor = field::Empty,
        org = field::Empty,
        role = field::Empty,
        hierarchy = field::Empty,
    );
    req.extensions_mut().insert(ctx);

    let mut res = next.run(req).instrument(span).await;
    if let Some(value) = header {
        res.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    res
}

/// Peer address first, then whatever proxies reported in `X-Forwarded-For`.
fn client_ips(req: &Request) -> Vec<String> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let forwarded = req
        .headers()
        .get(&FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string);

    peer.into_iter().chain(forwarded).collect()
}

/// Attach the caller's identity claims to the current request span.
fn record_identity(span: &Span, token: &VerifiedToken) {
    if let Ok(sub) = token.claim_str("sub") {
        span.record("actor", sub);
    }
    if let Ok(org) = token.claim_str("org") {
        span.record("org", org);
    }
    if let Ok(role) = token.claim_str(ROLE_CLAIM) {
        span.record("role", role);
    }
    if let Ok(level) = token.claim_i64(HIERARCHY_CLAIM) {
        span.record("hierarchy", level);
    }
}

#[derive(Clone)]
pub struct TokenState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Verify the bearer token, if any, and stash the claims for the guards.
///
/// Never rejects on its own: an absent or invalid token just leaves nothing in
/// the request extensions and the route's guards decide.
pub async fn token_middleware(
    State(state): State<TokenState>,
    mut req: Request,
    next: Next,
) -> Response {
    let verified = extract_bearer(req.headers()).and_then(|token| state.verifier.verify(token));

    match verified {
        Ok(token) => {
            record_identity(&Span::current(), &token);
            req.extensions_mut().insert(token);
        }
        Err(TokenVerificationError::Missing) => {}
        Err(e) => {
            tracing::debug!(error = %e, "bearer token not accepted");
        }
    }

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, TokenVerificationError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(TokenVerificationError::Missing)?;

    let header = header
        .to_str()
        .map_err(|_| TokenVerificationError::Rejected("authorization header is not ASCII".into()))?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| TokenVerificationError::Rejected("not a bearer credential".into()))?;

    let token = header.trim();
    if token.is_empty() {
        return Err(TokenVerificationError::Missing);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    use axum::{Router, body::Body, middleware::from_fn, middleware::from_fn_with_state, routing::get};
    use claimgate_auth::StaticTokenVerifier;
    use serde_json::json;
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn app() -> Router {
        let token = serde_json::from_value(
            json!({"sub": "u1", "org": "o1", "role": "admin", "hierarchy": 2}),
        )
        .unwrap();
        let verifier = StaticTokenVerifier::new().with_token("good", token);

        Router::new()
            .route(
                "/",
                get(|| async {
                    tracing::info!("handler reached");
                    "ok"
                }),
            )
            .layer(from_fn_with_state(
                TokenState {
                    verifier: Arc::new(verifier),
                },
                token_middleware,
            ))
            .layer(from_fn(request_id_middleware))
    }

    fn headers(auth: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        h
    }

    #[test]
    fn bearer_is_extracted_and_trimmed() {
        assert_eq!(extract_bearer(&headers("Bearer  abc ")).unwrap(), "abc");
    }

    #[test]
    fn absent_and_blank_bearers_count_as_missing() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(TokenVerificationError::Missing));
        assert_eq!(extract_bearer(&headers("Bearer ")), Err(TokenVerificationError::Missing));
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(matches!(
            extract_bearer(&headers("Basic dXNlcjpwdw==")),
            Err(TokenVerificationError::Rejected(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn request_logs_carry_identity_and_client_ips() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let req = Request::builder()
            .uri("/")
            .header(axum::http::header::AUTHORIZATION, "Bearer good")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        let request_id = res.headers()[&REQUEST_ID_HEADER].to_str().unwrap().to_string();

        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = logged
            .lines()
            .find(|l| l.contains("handler reached"))
            .expect("handler log line");
        let line: serde_json::Value = serde_json::from_str(line).unwrap();
        let span = &line["span"];
        assert_eq!(span["request_id"], request_id.as_str());
        assert_eq!(span["actor"], "u1");
        assert_eq!(span["org"], "o1");
        assert_eq!(span["role"], "admin");
        assert_eq!(span["hierarchy"], 2);
        let ips = span["ips"].as_str().unwrap();
        assert!(ips.contains("203.0.113.7") && ips.contains("10.0.0.1"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn anonymous_request_span_has_no_identity() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        app().oneshot(req).await.unwrap();

        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = logged
            .lines()
            .find(|l| l.contains("handler reached"))
            .expect("handler log line");
        let line: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(line["span"]["request_id"].is_string());
        assert!(line["span"].get("actor").is_none());
    }
}

use axum::http::Uri;

use claimgate_core::RequestId;
use claimgate_events::AuditContext;

/// Correlation context for a request.
///
/// Inserted by the request-id middleware and present for every route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: RequestId,
    endpoint: String,
}

impl RequestContext {
    pub fn new(request_id: RequestId, endpoint: impl Into<String>) -> Self {
        Self {
            request_id,
            endpoint: endpoint.into(),
        }
    }

    /// Context for `uri`, with a freshly generated id.
    pub fn for_uri(uri: &Uri) -> Self {
        let endpoint = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        Self::new(RequestId::generate(), endpoint)
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn audit(&self) -> AuditContext {
        AuditContext::new(self.request_id.clone(), self.endpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_query_string() {
        let ctx = RequestContext::for_uri(&"/users/me?expand=org".parse().unwrap());
        assert_eq!(ctx.endpoint(), "/users/me?expand=org");
        assert_eq!(ctx.request_id().as_str().len(), 24);

        let audit = ctx.audit();
        assert_eq!(audit.request_id, *ctx.request_id());
        assert_eq!(audit.source_type, None);
    }
}

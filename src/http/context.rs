//! Per-request context handed to handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::correlator::CorrelationId;

/// Identifies the request a handler is serving.
///
/// Inserted into request extensions by [`track_requests`](super::track_requests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    id: CorrelationId,
}

impl RequestContext {
    pub fn new(id: CorrelationId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &CorrelationId {
        &self.id
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestContext>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "request tracking middleware is not installed",
        ))
    }
}

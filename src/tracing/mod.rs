//! Request correlation and HTTP tracing.
//!
//! Every request gets a [`RequestId`], scoped in a task-local so error
//! bodies produced deep inside a handler can echo it back.

use axum::http::Request;
use std::{cell::RefCell, fmt, future::Future};
use tower_http::{
    classify::{SharedClassifier, StatusInRangeAsFailures},
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, MakeSpan, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID tracking information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    /// Accepts a client supplied id only if it is short printable ASCII.
    pub fn from_header(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let acceptable = !trimmed.is_empty()
            && trimmed.len() <= 128
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
        acceptable.then(|| RequestId::new(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RefCell<Option<RequestId>>;
}

pub async fn scope_request_id<Fut, R>(request_id: RequestId, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_ID
        .scope(RefCell::new(Some(request_id)), future)
        .await
}

pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

#[derive(Clone, Default)]
pub struct RequestSpanMaker;

impl<B> MakeSpan<B> for RequestSpanMaker {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .or_else(|| {
                request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(RequestId::from_header)
            })
            .unwrap_or_default();

        tracing::info_span!(
            "http.request",
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

pub type HttpTraceLayer = TraceLayer<
    SharedClassifier<StatusInRangeAsFailures>,
    RequestSpanMaker,
    DefaultOnRequest,
    DefaultOnResponse,
>;

/// HTTP tracing layer; 5xx responses are classified as failures
pub fn configure_http_tracing() -> HttpTraceLayer {
    let classifier = SharedClassifier::new(StatusInRangeAsFailures::new(500..=599));
    TraceLayer::new(classifier)
        .make_span_with(RequestSpanMaker)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_id_is_visible_inside_scope_only() {
        assert!(current_request_id().is_none());
        let seen = scope_request_id(RequestId::new("req-7"), async {
            current_request_id().map(|id| id.0)
        })
        .await;
        assert_eq!(seen.as_deref(), Some("req-7"));
        assert!(current_request_id().is_none());
    }

    #[test]
    fn header_values_are_sanitised() {
        assert!(RequestId::from_header("abc-123").is_some());
        assert!(RequestId::from_header("").is_none());
        assert!(RequestId::from_header("has space").is_none());
        assert!(RequestId::from_header(&"x".repeat(200)).is_none());
    }
}

use crate::tracing::{RequestId, REQUEST_ID_HEADER};
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Assigns a request id (reusing a well-formed client supplied one), exposes it
/// to handlers as an extension and echoes it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::from_header)
        .unwrap_or_default();

    let header_value = HeaderValue::from_str(request_id.as_str()).ok();
    if let Some(value) = header_value.clone() {
        request
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::debug_span!("request_id", request_id = %request_id);
    let mut response = crate::tracing::scope_request_id(
        request_id,
        async move { next.run(request).await }.instrument(span),
    )
    .await;

    if let Some(value) = header_value {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

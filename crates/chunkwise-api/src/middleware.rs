//! Request correlation

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use chunkwise_common::CorrelationId;

/// Header carrying the correlation id in both directions
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Per-request context inserted by [`correlation_id_middleware`]
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
}

impl RequestContext {
    /// Correlation id from an optional extension, or a fresh one
    pub fn correlation_id_or_new(context: Option<&Self>) -> CorrelationId {
        context.map_or_else(CorrelationId::new, |ctx| ctx.correlation_id.clone())
    }
}

/// Reuse the caller's `X-Correlation-ID` when it is a UUID, otherwise mint
/// one, and echo it on the response
pub async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map_or_else(CorrelationId::new, CorrelationId::from);

    request.extensions_mut().insert(RequestContext {
        correlation_id: correlation_id.clone(),
    });

    let mut response = next.run(request).await;
    if response.headers().contains_key(CORRELATION_ID_HEADER) {
        return response;
    }
    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

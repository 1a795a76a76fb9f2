use crate::middleware::RequestContext;
use axum::{Extension, Json, Router, routing::get};
use serde_json::json;
use tracing::{debug, instrument};

pub fn routes() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Liveness probe; the provider is not contacted
#[instrument(skip(context), fields(correlation_id))]
async fn health_check(context: Option<Extension<RequestContext>>) -> Json<serde_json::Value> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());
    debug!("Health check request");

    Json(json!({
        "status": "healthy",
        "service": "chunkwise-api",
        "version": env!("CARGO_PKG_VERSION"),
        "correlation_id": correlation_id.to_string()
    }))
}

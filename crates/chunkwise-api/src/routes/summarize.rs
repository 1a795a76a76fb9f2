//! Synchronous summarization
//!
//! `POST /api/summarize` runs the whole pipeline inside the request and
//! returns the job's result. A failed job is still a `200` whose body has
//! `status: "error"`; only malformed requests produce error responses.
//! These jobs are not registered, so they never appear under `/api/jobs`.
//!
//! ```json
//! POST /api/summarize
//! { "text": "Long document...", "model": "gpt-4" }
//! ```

use crate::middleware::RequestContext;
use crate::routes::request::{SummarizeRequest, parse_body};
use crate::{ApiResult, state::AppState};
use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use chunkwise_summarization::{ProgressTracker, SummaryResult};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/summarize", post(summarize_handler))
        .with_state(state)
}

#[instrument(skip_all, fields(correlation_id, job_id))]
async fn summarize_handler(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<Json<SummaryResult>> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let request = parse_body(payload, state.max_document_bytes, &correlation_id)?;
    request.validate(state.max_document_bytes, &correlation_id)?;

    let tracker = ProgressTracker::new(Uuid::new_v4());
    tracing::Span::current().record("job_id", tracker.job_id().to_string());
    info!(bytes = request.text.len(), "Summarizing document");

    // Lives only as long as the request
    let result = state
        .pipeline
        .process_text_document(
            &request.text,
            request.model_name(),
            &tracker,
            &CancellationToken::new(),
        )
        .await;

    Ok(Json(result))
}

//! Background summarization jobs
//!
//! - `POST /api/jobs` starts a job and answers `202` with its id
//! - `GET /api/jobs` lists every job, oldest first
//! - `GET /api/jobs/{job_id}` returns the job's progress
//! - `GET /api/jobs/{job_id}/result` returns the result once finished
//! - `DELETE /api/jobs/{job_id}` requests cancellation

use crate::middleware::RequestContext;
use crate::routes::request::{SummarizeRequest, parse_body};
use crate::{ApiError, ApiResult, state::AppState};
use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use chunkwise_common::CorrelationId;
use chunkwise_summarization::{JobStatus, ProgressState, SummaryResult};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, instrument};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JobAccepted {
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Where to poll for progress
    pub status_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobList {
    pub jobs: Vec<ProgressState>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelAccepted {
    pub job_id: Uuid,
    pub cancelling: bool,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/{job_id}", get(get_job).delete(cancel_job))
        .route("/api/jobs/{job_id}/result", get(get_job_result))
        .with_state(state)
}

#[instrument(skip_all, fields(correlation_id, job_id))]
async fn create_job(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let request = parse_body(payload, state.max_document_bytes, &correlation_id)?;
    request.validate(state.max_document_bytes, &correlation_id)?;

    let (job_id, tracker, cancel) = state.jobs.create();
    tracing::Span::current().record("job_id", job_id.to_string());
    info!(bytes = request.text.len(), "Queued background job");

    let pipeline = std::sync::Arc::clone(&state.pipeline);
    let jobs = std::sync::Arc::clone(&state.jobs);
    tokio::spawn(
        async move {
            let result = pipeline
                .process_text_document(&request.text, request.model_name(), &tracker, &cancel)
                .await;
            jobs.store_result(&job_id, result);
        }
        .in_current_span(),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id,
            status: JobStatus::Pending,
            status_url: format!("/api/jobs/{job_id}"),
        }),
    ))
}

async fn list_jobs(State(state): State<AppState>) -> Json<JobList> {
    Json(JobList {
        jobs: state.jobs.list(),
    })
}

async fn get_job(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ProgressState>> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    let job_id = parse_job_id(&job_id, &correlation_id)?;

    state
        .jobs
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| ApiError::job_not_found(job_id, correlation_id))
}

async fn get_job_result(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<SummaryResult>> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    let job_id = parse_job_id(&job_id, &correlation_id)?;

    if let Some(result) = state.jobs.result(&job_id) {
        return Ok(Json(result));
    }
    match state.jobs.get(&job_id) {
        Some(_) => Err(ApiError::job_conflict(
            job_id,
            "is still running",
            correlation_id,
        )),
        None => Err(ApiError::job_not_found(job_id, correlation_id)),
    }
}

async fn cancel_job(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    Path(job_id): Path<String>,
) -> ApiResult<(StatusCode, Json<CancelAccepted>)> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    let job_id = parse_job_id(&job_id, &correlation_id)?;

    if state.jobs.cancel(&job_id) {
        return Ok((
            StatusCode::ACCEPTED,
            Json(CancelAccepted {
                job_id,
                cancelling: true,
            }),
        ));
    }
    match state.jobs.get(&job_id) {
        Some(_) => Err(ApiError::job_conflict(
            job_id,
            "has already finished",
            correlation_id,
        )),
        None => Err(ApiError::job_not_found(job_id, correlation_id)),
    }
}

fn parse_job_id(raw: &str, correlation_id: &CorrelationId) -> ApiResult<Uuid> {
    Uuid::try_parse(raw).map_err(|_| {
        ApiError::validation(
            format!("'{raw}' is not a valid job id"),
            Some("job_id"),
            correlation_id.clone(),
        )
    })
}

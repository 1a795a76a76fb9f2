pub mod health;
pub mod jobs;
pub mod models;
pub mod request;
pub mod summarize;

pub use request::SummarizeRequest;

use crate::state::AppState;
use axum::{Router, extract::DefaultBodyLimit, middleware};

/// Extra room for JSON escaping on top of the raw document limit
const BODY_LIMIT_FACTOR: usize = 2;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .max_document_bytes
        .saturating_mul(BODY_LIMIT_FACTOR)
        .max(64 * 1024);

    Router::new()
        .merge(health::routes())
        .merge(models::routes(state.clone()))
        .merge(summarize::routes(state.clone()))
        .merge(jobs::routes(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(
            crate::middleware::correlation_id_middleware,
        ))
}

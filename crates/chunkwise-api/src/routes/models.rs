//! Model profile listing

use crate::state::AppState;
use axum::{Json, Router, extract::State, routing::get};
use chunkwise_config::ModelProfile;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub name: &'static str,
    #[serde(flatten)]
    pub profile: ModelProfile,
    /// Input tokens left after reserving the summary and overhead
    pub max_input_tokens: usize,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    /// Model used when a request names none
    pub default_model: String,
    pub models: Vec<ModelInfo>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/models", get(list_models))
        .with_state(state)
}

/// GET /api/models - built-in profiles in registry order
async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = ModelProfile::known_models()
        .map(|(name, profile)| ModelInfo {
            name,
            profile,
            max_input_tokens: profile.max_input_tokens(),
        })
        .collect();

    Json(ModelsResponse {
        default_model: state.pipeline.default_model().to_string(),
        models,
    })
}

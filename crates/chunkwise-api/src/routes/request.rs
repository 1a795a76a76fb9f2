//! Request bodies shared by the synchronous and background endpoints

use crate::{ApiError, ApiResult};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use chunkwise_common::CorrelationId;
use serde::{Deserialize, Serialize};

/// A document to summarize
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    /// Target model; the server default when omitted or blank
    #[serde(default)]
    pub model: Option<String>,
}

impl SummarizeRequest {
    /// Model name to hand to the pipeline, blank meaning the default
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or_default()
    }

    /// Reject blank and oversized documents
    ///
    /// # Errors
    /// Returns `ApiError::ValidationError` or `ApiError::PayloadTooLarge`
    pub fn validate(&self, max_document_bytes: usize, correlation_id: &CorrelationId) -> ApiResult<()> {
        if self.text.trim().is_empty() {
            return Err(ApiError::validation(
                "text must not be empty",
                Some("text"),
                correlation_id.clone(),
            ));
        }
        if self.text.len() > max_document_bytes {
            return Err(ApiError::PayloadTooLarge {
                size: self.text.len(),
                limit: max_document_bytes,
                correlation_id: correlation_id.clone(),
            });
        }
        Ok(())
    }
}

/// Unwrap a JSON body, turning extractor rejections into API errors
///
/// # Errors
/// Returns `ApiError::PayloadTooLarge` when the body limit was hit and
/// `ApiError::ValidationError` for any other malformed body
pub fn parse_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    max_document_bytes: usize,
    correlation_id: &CorrelationId,
) -> ApiResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ApiError::PayloadTooLarge {
                size: 0,
                limit: max_document_bytes,
                correlation_id: correlation_id.clone(),
            })
        }
        Err(rejection) => Err(ApiError::validation(
            rejection.body_text(),
            None,
            correlation_id.clone(),
        )),
    }
}

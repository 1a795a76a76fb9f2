//! Structured API errors
//!
//! Every error carries the request's correlation id, which is returned in
//! the JSON body and the `X-Correlation-ID` header.

use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chunkwise_common::CorrelationId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body or parameters failed validation
    #[error("Request validation failed: {message} (correlation: {correlation_id})")]
    ValidationError {
        message: String,
        field: Option<String>,
        correlation_id: CorrelationId,
    },

    /// The document is larger than the server accepts
    #[error(
        "Document of {size} bytes exceeds the {limit} byte limit (correlation: {correlation_id})"
    )]
    PayloadTooLarge {
        size: usize,
        limit: usize,
        correlation_id: CorrelationId,
    },

    #[error("Job '{job_id}' not found (correlation: {correlation_id})")]
    JobNotFound {
        job_id: String,
        correlation_id: CorrelationId,
    },

    /// The job is not in a state that allows the operation
    #[error("Job '{job_id}' {reason} (correlation: {correlation_id})")]
    JobConflict {
        job_id: String,
        reason: String,
        correlation_id: CorrelationId,
    },
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    pub correlation_id: CorrelationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub const fn correlation_id(&self) -> &CorrelationId {
        match self {
            Self::ValidationError { correlation_id, .. }
            | Self::PayloadTooLarge { correlation_id, .. }
            | Self::JobNotFound { correlation_id, .. }
            | Self::JobConflict { correlation_id, .. } => correlation_id,
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::JobNotFound { .. } => StatusCode::NOT_FOUND,
            Self::JobConflict { .. } => StatusCode::CONFLICT,
        }
    }

    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "VALIDATION_ERROR",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::JobNotFound { .. } => "JOB_NOT_FOUND",
            Self::JobConflict { .. } => "JOB_CONFLICT",
        }
    }

    pub fn validation(
        message: impl Into<String>,
        field: Option<&str>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: field.map(str::to_string),
            correlation_id,
        }
    }

    pub fn job_not_found(job_id: impl ToString, correlation_id: CorrelationId) -> Self {
        Self::JobNotFound {
            job_id: job_id.to_string(),
            correlation_id,
        }
    }

    pub fn job_conflict(
        job_id: impl ToString,
        reason: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::JobConflict {
            job_id: job_id.to_string(),
            reason: reason.into(),
            correlation_id,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let correlation_id = self.correlation_id().clone();

        warn!(
            correlation_id = %correlation_id,
            status = status.as_u16(),
            error = %self,
            "Client error"
        );

        let field = match &self {
            Self::ValidationError { field, .. } => field.clone(),
            _ => None,
        };
        let body = ApiErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            correlation_id: correlation_id.clone(),
            field,
        };

        let mut response = (status, Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
            response.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

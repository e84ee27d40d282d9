//! API Error Mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use config::ConfigError;
use data_validator::ValidationError;
use feature_engine::FeatureError;
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::{error, warn};

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// No model loaded (degraded state)
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// Body is not JSON or does not fit the request shape
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
    /// Well-formed body with contradictory or missing inputs
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Inputs outside their allowed ranges
    #[error("Invalid input ({} error(s))", .0.len())]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::InvalidRequest(_) | ApiError::Validation(_) | ApiError::Feature(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Inference(InferenceError::ModelLoadError(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short reason used as a metrics label
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::ModelUnavailable(_) => "model_unavailable",
            ApiError::Body(_) => "body",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::Validation(_) => "validation",
            ApiError::Feature(_) => "feature",
            ApiError::Inference(InferenceError::Schema(_)) => "schema_mismatch",
            ApiError::Inference(_) => "inference",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        metrics::counter!("demand_prediction_failures_total", "reason" => self.reason())
            .increment(1);

        let details = match &self {
            ApiError::Validation(errors) => errors.iter().map(|e| e.to_string()).collect(),
            _ => Vec::new(),
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Errors while installing the log subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Subscriber(#[from] SetGlobalDefaultError),
}

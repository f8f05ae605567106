//! API error types and HTTP response conversion
//!
//! Every failure leaves the service as `{error, message, code}` JSON with a
//! matching status. Graph and checkpoint errors are mapped by kind: unknown
//! threads become 404, model failures 502.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_graph::GraphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use thread_checkpoint::CheckpointError;

/// API error response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
}

impl ApiErrorResponse {
    /// Create a new API error response
    pub fn new(error: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Custom API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict (e.g., thread already exists)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// Workflow execution error
    #[error("Workflow error: {0}")]
    Graph(#[from] GraphError),

    /// Checkpoint store error
    #[error("Checkpoint store error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Graph(err) => match err {
                GraphError::ThreadNotFound(_) => StatusCode::NOT_FOUND,
                GraphError::NotInterrupted(_) => StatusCode::CONFLICT,
                GraphError::Model(_) => StatusCode::BAD_GATEWAY,
                GraphError::Checkpoint(CheckpointError::Invalid(_)) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Checkpoint(err) => {
                if err.is_not_found() {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            ApiError::JsonError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code identifier
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Graph(err) => match err {
                GraphError::ThreadNotFound(_) => "THREAD_NOT_FOUND",
                GraphError::NotInterrupted(_) => "THREAD_NOT_INTERRUPTED",
                GraphError::Model(_) => "MODEL_ERROR",
                _ => "WORKFLOW_ERROR",
            },
            ApiError::Checkpoint(err) => {
                if err.is_not_found() {
                    "CHECKPOINT_NOT_FOUND"
                } else {
                    "CHECKPOINT_ERROR"
                }
            }
            ApiError::JsonError(_) => "JSON_ERROR",
        }
    }

    /// Get the error type name
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::Conflict(_) => "Conflict",
            ApiError::InternalError(_) => "InternalError",
            ApiError::Graph(_) => "WorkflowError",
            ApiError::Checkpoint(_) => "CheckpointError",
            ApiError::JsonError(_) => "JsonError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiErrorResponse::new(self.error_type(), self.to_string(), self.code());

        if status.is_server_error() {
            tracing::error!("API Error: {:?}", body);
        } else {
            tracing::warn!("API Error: {:?}", body);
        }

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::JsonError(err.to_string())
    }
}

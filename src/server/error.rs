//! Error types for the HTTP service

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::PipelineError;

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors returned by the HTTP handlers
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The multipart body had no `file` field
    #[error("No file uploaded")]
    MissingFile,

    /// The multipart body could not be read
    #[error("Invalid upload: {0}")]
    Upload(#[from] MultipartError),

    /// The pipeline failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ServiceError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::MissingFile => StatusCode::BAD_REQUEST,
            ServiceError::Upload(err) => err.status(),
            ServiceError::Pipeline(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ServiceError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        if self.status().is_server_error() {
            format!("Processing failed: {self}")
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(ErrorBody { error: self.message() })).into_response()
    }
}

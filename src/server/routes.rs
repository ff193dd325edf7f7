//! Route handlers
//!
//! - `POST /api/modernize` takes a multipart upload with a `file` field and
//!   answers with the canonical result in its wire shape.
//! - `GET /api/health` reports whether generation is configured.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ServiceError;
use crate::llm::GenerationClient;
use crate::pipeline::{ModernizationPipeline, ModernizeResponse};

/// Multipart field carrying the upload
pub const UPLOAD_FIELD: &str = "file";

/// Shared handler state
pub struct AppState<C: GenerationClient> {
    pub pipeline: Arc<ModernizationPipeline<C>>,
}

impl<C: GenerationClient> AppState<C> {
    pub fn new(pipeline: Arc<ModernizationPipeline<C>>) -> Self {
        Self { pipeline }
    }
}

// Manual impl: a derive would require `C: Clone`
impl<C: GenerationClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub generation: bool,
    pub model: String,
}

/// POST /api/modernize
pub async fn modernize<C: GenerationClient + 'static>(
    State(state): State<AppState<C>>,
    mut multipart: Multipart,
) -> Result<Json<ModernizeResponse>, ServiceError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        debug!(file_name = ?file_name, bytes = bytes.len(), "Received upload");
        upload = Some(bytes);
        break;
    }

    let bytes = upload.ok_or(ServiceError::MissingFile)?;
    let report = state.pipeline.run(bytes.to_vec()).await?;
    Ok(Json(report.result.into_response()))
}

/// GET /api/health
pub async fn health<C: GenerationClient + 'static>(
    State(state): State<AppState<C>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        generation: state.pipeline.generation_enabled(),
        model: state.pipeline.config().generation.model.clone(),
    })
}

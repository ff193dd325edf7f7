//! Error types for pipeline operations
//!
//! Only `PipelineError::Ingest` ever reaches a caller as a failure. The
//! chain and reconciliation errors are recovered inside the pipeline and
//! remain visible through the stage log and tracing output.

use thiserror::Error;

use super::result::StageName;
use crate::ingest::IngestError;
use crate::llm::GenerationError;

/// Failure of the three-stage chain as a whole
#[derive(Error, Debug)]
pub enum ChainError {
    /// A generation call failed
    #[error("{stage} stage generation failed: {source}")]
    Generation {
        stage: StageName,
        #[source]
        source: GenerationError,
    },

    /// A stage whose output must be structured returned something else
    #[error("{stage} stage returned unusable output: {reason}")]
    MalformedOutput { stage: StageName, reason: String },
}

/// Result type for the chain
pub type ChainResult<T> = Result<T, ChainError>;

impl ChainError {
    /// Create a generation failure for a stage
    pub fn generation(stage: StageName, source: GenerationError) -> Self {
        Self::Generation { stage, source }
    }

    /// Create a malformed-output failure for a stage
    pub fn malformed(stage: StageName, reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            stage,
            reason: reason.into(),
        }
    }

    /// The stage that aborted the chain
    pub fn stage(&self) -> StageName {
        match self {
            ChainError::Generation { stage, .. } => *stage,
            ChainError::MalformedOutput { stage, .. } => *stage,
        }
    }
}

/// Why raw composite text could not be read as a whole document
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Not parseable as JSON
    #[error("Composite output is not JSON: {0}")]
    NotJson(String),

    /// JSON, but not an object
    #[error("Composite output is JSON but not an object")]
    NotAnObject,

    /// Object with fields of the wrong type
    #[error("Composite output has an unexpected shape: {0}")]
    UnexpectedShape(String),
}

/// Errors that can surface from a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The upload could not be ingested
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Pipeline configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Whether the caller supplied bad input
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Ingest(_))
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Ingest(err) => err.user_message(),
            PipelineError::ConfigError(msg) => {
                format!("Configuration error: {msg}\n\nHint: Check your configuration file.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_error_display() {
        let err = ChainError::generation(StageName::Schema, GenerationError::Timeout(10_000));
        assert_eq!(err.stage(), StageName::Schema);
        assert_eq!(
            err.to_string(),
            "Schema stage generation failed: Generation request timed out after 10000 ms"
        );

        let err = ChainError::malformed(StageName::Structure, "expected a JSON array");
        assert_eq!(err.stage(), StageName::Structure);
        assert!(err.to_string().contains("expected a JSON array"));
    }

    #[test]
    fn test_chain_error_source() {
        use std::error::Error as _;
        let err = ChainError::generation(StageName::Code, GenerationError::EmptyCompletion);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_pipeline_error_classification() {
        let err: PipelineError = IngestError::Empty.into();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), IngestError::Empty.to_string());
        assert!(err.user_message().contains("Hint:"));

        let err = PipelineError::ConfigError("bad".to_string());
        assert!(!err.is_client_error());
        assert!(err.user_message().contains("Hint:"));
    }

    #[test]
    fn test_reconcile_error_display() {
        assert!(
            ReconcileError::NotJson("eof".to_string())
                .to_string()
                .contains("eof")
        );
        assert_eq!(
            ReconcileError::NotAnObject.to_string(),
            "Composite output is JSON but not an object"
        );
    }
}

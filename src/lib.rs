//! Legacy Modernizer - turns legacy tabular exports into modern artifacts
//!
//! Provides:
//! - Delimited text ingestion (field set, uniform records, prompt sample)
//! - A generation client for OpenAI-compatible chat-completions endpoints
//! - The three-stage modernization chain (structure, schema, service code)
//! - Reconciliation of loosely structured generator output
//! - Deterministic fallback artifacts when generation is unavailable
//! - An HTTP upload service (requires `server` feature)

pub mod config;
pub mod ingest;
pub mod llm;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use config::{ConfigError, ModernizerConfig, ServerConfig};
pub use ingest::{FieldSet, IngestConfig, IngestError, IngestedTable, Record, TabularIngestor};
pub use llm::{
    ChatCompletionsClient, GenerationClient, GenerationConfig, GenerationError, GenerationParams,
};
pub use pipeline::{
    CanonicalResult, FallbackSynthesizer, ModernizationPipeline, ModernizationReport,
    ModernizeResponse, PipelineError, PipelineResult, StageOutcome, StageSettings,
};

//! Modernization pipeline
//!
//! This module turns one upload into one `CanonicalResult`:
//! - Ingestion of the delimited text into fields, records and a sample
//! - A three-stage generation chain (structure, schema, service code)
//! - Reconciliation of the chain output into canonical artifacts
//! - Deterministic fallback artifacts when the chain fails or is disabled
//!
//! # Example
//!
//! ```rust,ignore
//! use legacy_modernizer::{ChatCompletionsClient, ModernizationPipeline, ModernizerConfig};
//!
//! let config = ModernizerConfig::default().with_env_overrides();
//! let client = ChatCompletionsClient::new(&config.generation);
//! let pipeline = ModernizationPipeline::new(config, client)?;
//!
//! let report = pipeline.run(std::fs::read("customers.csv")?).await?;
//! println!("{}", serde_json::to_string_pretty(&report.result.into_response())?);
//! ```
//!
//! # States
//!
//! `Ingesting -> Generating -> Reconciling -> Done` on the generation path,
//! `Ingesting -> Fallback -> Done` when generation is disabled,
//! `Generating -> Fallback -> Done` when the chain fails, and
//! `Ingesting -> Failed` when the upload cannot be ingested. Only the last
//! one surfaces as an error.

pub mod chain;
pub mod config;
pub mod error;
pub mod executor;
pub mod fallback;
pub mod reconcile;
pub mod result;

pub use chain::{ChainController, ChainOutput, CodeStageOutcome};
pub use config::StageSettings;
pub use error::{ChainError, ChainResult, PipelineError, PipelineResult, ReconcileError};
pub use executor::{ModernizationPipeline, ModernizationReport, PipelineState};
pub use fallback::FallbackSynthesizer;
pub use reconcile::{OutputReconciler, ParsedComposite, ReconcileInput};
pub use result::{
    AppFiles, Artifacts, CANONICAL_APP_FILES, CanonicalResult, ModernizeResponse, StageEntry,
    StageLog, StageName, StageOutcome,
};

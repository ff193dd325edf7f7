//! Pipeline executor for one upload

use std::time::Instant;

use serde::Serialize;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::chain::ChainController;
use super::error::{PipelineError, PipelineResult};
use super::fallback::FallbackSynthesizer;
use super::reconcile::{OutputReconciler, ReconcileInput};
use super::result::{Artifacts, CanonicalResult};
use crate::config::ModernizerConfig;
use crate::ingest::{IngestedTable, TabularIngestor};
use crate::llm::GenerationClient;

/// Per-request pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// Parsing the upload
    Ingesting,
    /// Running the generation chain
    Generating,
    /// Normalizing chain output
    Reconciling,
    /// Synthesizing artifacts without generation
    Fallback,
    /// Canonical result assembled
    Done,
    /// Ingestion failed; no result
    Failed,
}

impl PipelineState {
    /// Get state name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ingesting => "ingesting",
            Self::Generating => "generating",
            Self::Reconciling => "reconciling",
            Self::Fallback => "fallback",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Report from one pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModernizationReport {
    /// Request ID
    pub request_id: Uuid,
    /// States visited, in order
    pub states: Vec<PipelineState>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// The canonical result
    pub result: CanonicalResult,
}

impl ModernizationReport {
    /// Check whether any stage output was substituted
    pub fn used_fallback(&self) -> bool {
        self.result.used_fallback()
    }

    /// Check whether the generation chain was abandoned
    pub fn took_fallback_path(&self) -> bool {
        self.states.contains(&PipelineState::Fallback)
    }
}

/// Runs ingestion, generation and reconciliation for uploads
///
/// Holds no per-request state, so one instance can serve concurrent requests.
pub struct ModernizationPipeline<C: GenerationClient> {
    client: C,
    config: ModernizerConfig,
    ingestor: TabularIngestor,
}

impl<C: GenerationClient> ModernizationPipeline<C> {
    /// Create a new pipeline
    pub fn new(config: ModernizerConfig, client: C) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::ConfigError)?;
        let ingestor = TabularIngestor::new(config.ingest.clone());
        Ok(Self {
            client,
            config,
            ingestor,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &ModernizerConfig {
        &self.config
    }

    /// Get the generation client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Whether the generation chain will be attempted
    pub fn generation_enabled(&self) -> bool {
        self.config.generation.is_enabled()
    }

    /// Run the pipeline over uploaded bytes
    ///
    /// The bytes are dropped once ingestion finishes, before any generation call.
    pub async fn run(&self, upload: Vec<u8>) -> PipelineResult<ModernizationReport> {
        let request_id = Uuid::new_v4();
        let span = info_span!("modernize", request_id = %request_id, bytes = upload.len());

        async move {
            let start = Instant::now();
            let mut states = vec![PipelineState::Ingesting];

            let ingested = self.ingestor.ingest_bytes(&upload);
            drop(upload);
            let table = match ingested {
                Ok(table) => table,
                Err(e) => {
                    states.push(PipelineState::Failed);
                    error!(error = %e, "Ingestion failed");
                    return Err(PipelineError::from(e));
                }
            };

            let result = self.modernize_table(&table, &mut states).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            info!(
                records = table.record_count(),
                fallback = result.used_fallback(),
                duration_ms,
                "Modernization completed"
            );

            Ok(ModernizationReport {
                request_id,
                states,
                duration_ms,
                result,
            })
        }
        .instrument(span)
        .await
    }

    /// Run the pipeline over already decoded text
    pub async fn run_text(&self, text: &str) -> PipelineResult<ModernizationReport> {
        self.run(text.as_bytes().to_vec()).await
    }

    /// Produce the canonical result for an ingested table
    pub async fn modernize(&self, table: &IngestedTable) -> CanonicalResult {
        let mut states = Vec::new();
        self.modernize_table(table, &mut states).await
    }

    async fn modernize_table(
        &self,
        table: &IngestedTable,
        states: &mut Vec<PipelineState>,
    ) -> CanonicalResult {
        let artifacts = self.generate(table, states).await;
        let result = CanonicalResult::assemble(table.sample.clone(), artifacts);
        states.push(PipelineState::Done);
        result
    }

    async fn generate(&self, table: &IngestedTable, states: &mut Vec<PipelineState>) -> Artifacts {
        if !self.generation_enabled() {
            debug!("Generation disabled, synthesizing artifacts");
            states.push(PipelineState::Fallback);
            return FallbackSynthesizer::synthesize(&table.fields, &table.records);
        }

        states.push(PipelineState::Generating);
        info!(model = self.client.model_name(), "Starting generation chain");

        let chain = ChainController::new(&self.client, &self.config.stages);
        match chain.run(&table.sample).await {
            Ok(output) => {
                states.push(PipelineState::Reconciling);
                OutputReconciler::new(&table.fields).reconcile(ReconcileInput::Composite(output))
            }
            Err(e) => {
                warn!(stage = %e.stage(), error = %e, "Generation chain failed, synthesizing artifacts");
                states.push(PipelineState::Fallback);
                FallbackSynthesizer::synthesize(&table.fields, &table.records)
            }
        }
    }
}

//! Three-stage generation chain
//!
//! Runs the structure, schema and code stages strictly in sequence. Each stage
//! result is an explicit `ChainResult` handed to the next stage. A structure
//! failure or any generation failure aborts the chain; an unparseable code
//! stage degrades to empty defaults and is reported as `CodeStageOutcome`.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::StageSettings;
use super::error::{ChainError, ChainResult};
use super::result::{AppFiles, Artifacts, StageEntry, StageLog, StageName};
use crate::llm::prompt::{code_prompt, schema_prompt, structure_prompt};
use crate::llm::{GenerationClient, GenerationError, parse_json_completion};

/// Number of structure elements shown to the schema stage
pub const SCHEMA_PREVIEW_LEN: usize = 3;

/// Parsed outcome of the code stage
#[derive(Debug, Clone, PartialEq)]
pub enum CodeStageOutcome {
    /// The completion was a JSON object
    Parsed { api_code: String, app_files: AppFiles },
    /// The completion could not be read; defaults apply
    Unparseable { reason: String },
}

impl CodeStageOutcome {
    /// Interpret a code-stage completion
    ///
    /// Expects a JSON object with `apiCode` and `fullAppFiles`. Missing keys
    /// default to empty values. Non-string file contents are kept as
    /// pretty-printed JSON.
    pub fn parse(completion: &str) -> Self {
        let value = match parse_json_completion(completion) {
            Ok(value) => value,
            Err(e) => {
                return Self::Unparseable {
                    reason: format!("not valid JSON: {e}"),
                };
            }
        };

        let Value::Object(mut object) = value else {
            return Self::Unparseable {
                reason: "expected a JSON object".to_string(),
            };
        };

        let api_code = match object.remove("apiCode") {
            Some(Value::String(code)) => code,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let app_files = match object.remove("fullAppFiles") {
            Some(Value::Object(files)) => files
                .into_iter()
                .map(|(name, content)| (name, value_to_text(content)))
                .collect(),
            _ => AppFiles::new(),
        };

        Self::Parsed {
            api_code,
            app_files,
        }
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => format!("{other:#}"),
    }
}

/// Successful output of the chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutput {
    /// Elements of the structure stage's JSON array
    pub structure: Vec<Value>,
    /// Schema stage text
    pub schema_text: String,
    /// Query endpoint source, empty when the code stage degraded
    pub api_code: String,
    /// Service files, empty when the code stage degraded
    pub app_files: AppFiles,
    /// Three stage entries
    pub stage_log: StageLog,
}

impl ChainOutput {
    /// Whether every structure element is a record-like object
    pub fn is_structured(&self) -> bool {
        self.structure.iter().all(Value::is_object)
    }

    /// Convert into pipeline artifacts unchanged
    pub fn into_artifacts(self) -> Artifacts {
        Artifacts {
            records: self.structure,
            schema_text: self.schema_text,
            api_code: self.api_code,
            app_files: self.app_files,
            stage_log: self.stage_log,
        }
    }
}

/// Drives the three dependent generation stages
pub struct ChainController<'a, C: GenerationClient + ?Sized> {
    client: &'a C,
    settings: &'a StageSettings,
}

impl<'a, C: GenerationClient + ?Sized> ChainController<'a, C> {
    /// Create a controller over a client and per-stage settings
    pub fn new(client: &'a C, settings: &'a StageSettings) -> Self {
        Self { client, settings }
    }

    /// Run all three stages against the export sample
    pub async fn run(&self, sample: &str) -> ChainResult<ChainOutput> {
        let structure = self.structure_stage(sample).await?;
        info!(stage = %StageName::Structure, elements = structure.len(), "Stage completed");

        let schema_text = self.schema_stage(&structure).await?;
        info!(stage = %StageName::Schema, "Stage completed");

        let code = self.code_stage(&structure, &schema_text).await?;

        let structure_entry = StageEntry::complete(StageName::Structure, "JSON inferred successfully");
        let schema_entry = StageEntry::complete(StageName::Schema, "DB schema generated");

        let (api_code, app_files, code_entry) = match code {
            CodeStageOutcome::Parsed {
                api_code,
                app_files,
            } => {
                info!(stage = %StageName::Code, files = app_files.len(), "Stage completed");
                (
                    api_code,
                    app_files,
                    StageEntry::complete(StageName::Code, "API and full app generated"),
                )
            }
            CodeStageOutcome::Unparseable { reason } => {
                warn!(stage = %StageName::Code, %reason, "Code stage output unusable, using empty defaults");
                (
                    String::new(),
                    AppFiles::new(),
                    StageEntry::fallback(StageName::Code, "Fallback: Unparseable code output"),
                )
            }
        };

        Ok(ChainOutput {
            structure,
            schema_text,
            api_code,
            app_files,
            stage_log: StageLog::new(structure_entry, schema_entry, code_entry),
        })
    }

    /// Stage 1: infer a JSON array of records from the sample
    async fn structure_stage(&self, sample: &str) -> ChainResult<Vec<Value>> {
        let completion = self
            .call(StageName::Structure, &structure_prompt(sample))
            .await?;

        match parse_json_completion(&completion) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => Err(ChainError::malformed(
                StageName::Structure,
                "expected a JSON array",
            )),
            Err(e) => Err(ChainError::malformed(
                StageName::Structure,
                format!("not valid JSON: {e}"),
            )),
        }
    }

    /// Stage 2: derive a table definition from a preview of the structure
    async fn schema_stage(&self, structure: &[Value]) -> ChainResult<String> {
        let preview = &structure[..structure.len().min(SCHEMA_PREVIEW_LEN)];
        let preview_json = Value::Array(preview.to_vec()).to_string();

        let completion = self
            .call(StageName::Schema, &schema_prompt(&preview_json))
            .await?;
        Ok(completion.trim().to_string())
    }

    /// Stage 3: derive the endpoint and service files
    async fn code_stage(
        &self,
        structure: &[Value],
        schema_text: &str,
    ) -> ChainResult<CodeStageOutcome> {
        let records_json = Value::Array(structure.to_vec()).to_string();

        let completion = self
            .call(StageName::Code, &code_prompt(&records_json, schema_text))
            .await?;
        Ok(CodeStageOutcome::parse(&completion))
    }

    /// Issue one generation call, bounded by the stage timeout
    async fn call(&self, stage: StageName, prompt: &str) -> ChainResult<String> {
        let params = self.settings.for_stage(stage);
        debug!(
            stage = %stage,
            model = self.client.model_name(),
            prompt_chars = prompt.len(),
            timeout_ms = params.timeout_ms,
            "Sending stage prompt"
        );

        match tokio::time::timeout(params.timeout(), self.client.generate(prompt, params)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ChainError::generation(stage, e)),
            Err(_) => Err(ChainError::generation(
                stage,
                GenerationError::Timeout(params.timeout_ms),
            )),
        }
    }
}

//! Canonical result types
//!
//! `CanonicalResult` is the only shape that leaves the pipeline. Its stage
//! log always has exactly three entries and its app files always carry the
//! three canonical file names; both invariants are enforced by the types here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File names every generated service must provide
pub const CANONICAL_APP_FILES: [&str; 3] = ["app.js", "package.json", "data.js"];

/// The three stages of the modernization chain, in execution order
///
/// Serialized under the labels existing consumers display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    /// Stage 1: infer structured records from the sample
    #[serde(rename = "Parser")]
    Structure,
    /// Stage 2: derive a relational schema
    Schema,
    /// Stage 3: derive the query endpoint and service files
    #[serde(rename = "Optimizer")]
    Code,
}

impl StageName {
    /// Get all stages in execution order
    pub fn all() -> [Self; 3] {
        [Self::Structure, Self::Schema, Self::Code]
    }

    /// Get stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Structure => "Structure",
            Self::Schema => "Schema",
            Self::Code => "Code",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a stage's output was generated or substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    /// Generated content was used
    Complete,
    /// A deterministic substitute was used
    Fallback,
}

/// One stage log entry
///
/// Serialized as `{agent, output, status}` for existing consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    /// Which stage this entry describes
    #[serde(rename = "agent")]
    pub stage: StageName,
    /// Short human-readable summary
    #[serde(rename = "output")]
    pub summary: String,
    /// Outcome of the stage
    #[serde(rename = "status")]
    pub outcome: StageOutcome,
}

impl StageEntry {
    /// Create a completed entry
    pub fn complete(stage: StageName, summary: impl Into<String>) -> Self {
        Self {
            stage,
            summary: summary.into(),
            outcome: StageOutcome::Complete,
        }
    }

    /// Create a fallback entry
    pub fn fallback(stage: StageName, summary: impl Into<String>) -> Self {
        Self {
            stage,
            summary: summary.into(),
            outcome: StageOutcome::Fallback,
        }
    }
}

/// Exactly three stage entries in execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageLog([StageEntry; 3]);

impl StageLog {
    /// Build a log from the three stage entries
    pub fn new(structure: StageEntry, schema: StageEntry, code: StageEntry) -> Self {
        Self([structure, schema, code])
    }

    /// Build a log marking every stage as fallback with the given summaries
    pub fn all_fallback(summaries: [&str; 3]) -> Self {
        let [structure, schema, code] = summaries;
        Self::new(
            StageEntry::fallback(StageName::Structure, structure),
            StageEntry::fallback(StageName::Schema, schema),
            StageEntry::fallback(StageName::Code, code),
        )
    }

    /// Entries in execution order
    pub fn entries(&self) -> &[StageEntry] {
        &self.0
    }

    /// Entry for a given stage
    pub fn entry(&self, stage: StageName) -> &StageEntry {
        match stage {
            StageName::Structure => &self.0[0],
            StageName::Schema => &self.0[1],
            StageName::Code => &self.0[2],
        }
    }

    /// Whether every stage completed with generated content
    pub fn is_all_complete(&self) -> bool {
        self.0.iter().all(|e| e.outcome == StageOutcome::Complete)
    }

    /// Whether every stage fell back
    pub fn is_all_fallback(&self) -> bool {
        self.0.iter().all(|e| e.outcome == StageOutcome::Fallback)
    }
}

/// Service files keyed by file name, canonical names first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppFiles(IndexMap<String, String>);

impl AppFiles {
    /// Create an empty file set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    /// Add or replace a file
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.0.insert(name.into(), content.into());
    }

    /// Insert any missing canonical file with empty content
    pub fn ensure_canonical(mut self) -> Self {
        for name in CANONICAL_APP_FILES {
            self.0.entry(name.to_string()).or_default();
        }
        self
    }

    /// Content of one file
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// File names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no files
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every file is empty
    pub fn is_blank(&self) -> bool {
        self.0.values().all(|content| content.is_empty())
    }
}

impl FromIterator<(String, String)> for AppFiles {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Artifacts produced by the chain, the reconciler or the fallback synthesizer
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    /// Record-like JSON objects
    pub records: Vec<Value>,
    /// Relational table definition
    pub schema_text: String,
    /// Query endpoint source
    pub api_code: String,
    /// Deployable service files
    pub app_files: AppFiles,
    /// Per-stage outcomes
    pub stage_log: StageLog,
}

/// The single output contract of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    /// Header plus first data lines of the upload
    pub sample_text: String,
    /// Record-like JSON objects
    pub records: Vec<Value>,
    /// Relational table definition
    pub schema_text: String,
    /// Query endpoint source
    pub api_code_text: String,
    /// Deployable service files, always including the canonical names
    pub app_files: AppFiles,
    /// Exactly three stage entries
    pub stage_log: StageLog,
}

impl CanonicalResult {
    /// Assemble the canonical result; this is the only constructor
    pub fn assemble(sample_text: impl Into<String>, artifacts: Artifacts) -> Self {
        Self {
            sample_text: sample_text.into(),
            records: artifacts.records,
            schema_text: artifacts.schema_text,
            api_code_text: artifacts.api_code,
            app_files: artifacts.app_files.ensure_canonical(),
            stage_log: artifacts.stage_log,
        }
    }

    /// Whether any stage output was substituted
    pub fn used_fallback(&self) -> bool {
        !self.stage_log.is_all_complete()
    }

    /// Convert into the wire response of the upload endpoint
    pub fn into_response(self) -> ModernizeResponse {
        let microservices = serde_json::to_string(&self.app_files).unwrap_or_default();
        ModernizeResponse {
            original: self.sample_text,
            json_data: self.records,
            db_schema: self.schema_text,
            api_code: self.api_code_text,
            microservices,
            full_app_files: self.app_files,
            agent_steps: self.stage_log,
        }
    }
}

/// JSON body returned by the upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModernizeResponse {
    /// Sample text of the upload
    pub original: String,
    /// Records
    pub json_data: Vec<Value>,
    /// Table definition
    pub db_schema: String,
    /// Query endpoint source
    pub api_code: String,
    /// `fullAppFiles` serialized as a string, kept for older consumers
    pub microservices: String,
    /// Service files
    pub full_app_files: AppFiles,
    /// Stage log
    pub agent_steps: StageLog,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> StageLog {
        StageLog::new(
            StageEntry::complete(StageName::Structure, "ok"),
            StageEntry::complete(StageName::Schema, "ok"),
            StageEntry::fallback(StageName::Code, "defaulted"),
        )
    }

    #[test]
    fn test_stage_log_queries() {
        let log = sample_log();
        assert_eq!(log.entries().len(), 3);
        assert!(!log.is_all_complete());
        assert!(!log.is_all_fallback());
        assert_eq!(log.entry(StageName::Code).outcome, StageOutcome::Fallback);
        assert_eq!(log.entry(StageName::Schema).summary, "ok");

        let log = StageLog::all_fallback(["a", "b", "c"]);
        assert!(log.is_all_fallback());
        assert_eq!(log.entries()[2].stage, StageName::Code);
    }

    #[test]
    fn test_stage_log_wire_format() {
        let json = serde_json::to_value(sample_log()).unwrap();
        assert_eq!(
            json[0],
            serde_json::json!({"agent": "Parser", "output": "ok", "status": "complete"})
        );
        assert_eq!(json[2]["agent"], "Optimizer");
        assert_eq!(json[2]["status"], "fallback");
        assert_eq!(json.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_app_files_ensure_canonical() {
        let files = AppFiles::new()
            .with_file("Dockerfile", "FROM node:20")
            .with_file("app.js", "x")
            .ensure_canonical();
        assert_eq!(files.len(), 4);
        assert_eq!(files.get("app.js"), Some("x"));
        assert_eq!(files.get("package.json"), Some(""));
        assert_eq!(files.get("data.js"), Some(""));
        assert!(!files.is_blank());

        assert!(AppFiles::new().ensure_canonical().is_blank());
    }

    #[test]
    fn test_assemble_and_response() {
        let artifacts = Artifacts {
            records: vec![serde_json::json!({"id": "1"})],
            schema_text: "CREATE TABLE t (id INT PRIMARY KEY);".to_string(),
            api_code: "export async function GET() {}".to_string(),
            app_files: AppFiles::new().with_file("app.js", "app"),
            stage_log: sample_log(),
        };
        let result = CanonicalResult::assemble("id\n1", artifacts);
        assert!(result.used_fallback());
        let names: Vec<&str> = result.app_files.names().collect();
        assert_eq!(names, ["app.js", "package.json", "data.js"]);

        let response = result.into_response();
        assert_eq!(response.original, "id\n1");
        assert_eq!(
            response.microservices,
            r#"{"app.js":"app","package.json":"","data.js":""}"#
        );

        let json = serde_json::to_value(&response).unwrap();
        for key in [
            "original",
            "jsonData",
            "dbSchema",
            "apiCode",
            "microservices",
            "fullAppFiles",
            "agentSteps",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}

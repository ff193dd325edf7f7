//! Output reconciliation
//!
//! Normalizes chain output into pipeline artifacts. A structured chain result
//! passes through unchanged; one whose records are not all objects keeps its
//! fields but is logged as fallback. Raw composite text goes through a two-phase
//! parser: the whole text is first read as one JSON document, and when that is
//! rejected it is split into `---`-delimited sections.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::chain::ChainOutput;
use super::error::ReconcileError;
use super::fallback::{FALLBACK_TABLE, column_definitions};
use super::result::{AppFiles, Artifacts, StageLog};
use crate::ingest::FieldSet;
use crate::llm::{parse_json_completion, strip_fence_markers};

/// Section separator in raw composite text
pub const SECTION_SEPARATOR: &str = "---";

/// Api code used when the raw text has no api section
pub const MISSING_API_CODE: &str = "// See fallback in logs";

/// Stage summaries for a reconciled raw or irregular result
pub const RECONCILED_SUMMARIES: [&str; 3] =
    ["Fallback parse", "Fallback schema", "Fallback optimization"];

/// What the reconciler is given
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileInput {
    /// Structured chain output
    Composite(ChainOutput),
    /// Loosely structured text
    Raw(String),
}

/// Whole-document form of raw composite text
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeDocument {
    #[serde(default)]
    pub json_data: Vec<Value>,
    #[serde(default)]
    pub db_schema: String,
    #[serde(default)]
    pub api_code: String,
    #[serde(default)]
    pub full_app_files: AppFiles,
}

/// Section-split form of raw composite text
///
/// Blank sections are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSections {
    pub records: Vec<Value>,
    pub schema: Option<String>,
    pub api_code: Option<String>,
    pub app_js: Option<String>,
}

impl RawSections {
    /// Split on the separator, strip fence markers, read the first section as JSON
    pub fn split(text: &str) -> Self {
        let mut sections = text
            .split(SECTION_SEPARATOR)
            .map(strip_fence_markers)
            .map(|section| (!section.is_empty()).then_some(section));

        let first = sections.next().flatten();
        let records = match first.map(|s| serde_json::from_str::<Value>(&s)) {
            Some(Ok(Value::Array(items))) => items,
            Some(Ok(_)) => {
                debug!("First section is JSON but not an array");
                Vec::new()
            }
            Some(Err(e)) => {
                debug!(error = %e, "First section is not JSON");
                Vec::new()
            }
            None => Vec::new(),
        };

        Self {
            records,
            schema: sections.next().flatten(),
            api_code: sections.next().flatten(),
            app_js: sections.next().flatten(),
        }
    }
}

/// Result of the two-phase raw parser
#[derive(Debug)]
pub enum ParsedComposite {
    /// Phase 1: the text was one JSON document
    Document(CompositeDocument),
    /// Phase 2: the text was split into sections
    Sections {
        sections: RawSections,
        /// Why phase 1 rejected the text
        rejected: ReconcileError,
    },
}

/// Phase 1: read the whole text as a composite JSON document
pub fn parse_document(text: &str) -> Result<CompositeDocument, ReconcileError> {
    let value = parse_json_completion(text)
        .map_err(|e| ReconcileError::NotJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ReconcileError::NotAnObject);
    }
    serde_json::from_value(value).map_err(|e| ReconcileError::UnexpectedShape(e.to_string()))
}

/// Normalizes chain output into artifacts
pub struct OutputReconciler<'a> {
    fields: &'a FieldSet,
}

impl<'a> OutputReconciler<'a> {
    /// Create a reconciler for a table's fields
    pub fn new(fields: &'a FieldSet) -> Self {
        Self { fields }
    }

    /// Parse raw composite text in two explicit phases
    pub fn parse_raw(text: &str) -> ParsedComposite {
        match parse_document(text) {
            Ok(document) => ParsedComposite::Document(document),
            Err(rejected) => ParsedComposite::Sections {
                sections: RawSections::split(text),
                rejected,
            },
        }
    }

    /// Reconcile chain output into artifacts; never fails
    pub fn reconcile(&self, input: ReconcileInput) -> Artifacts {
        match input {
            ReconcileInput::Composite(output) if output.is_structured() => {
                output.into_artifacts()
            }
            ReconcileInput::Composite(output) => self.from_irregular(output),
            ReconcileInput::Raw(text) => self.from_parsed(Self::parse_raw(&text)),
        }
    }

    fn from_irregular(&self, output: ChainOutput) -> Artifacts {
        warn!("Structure stage returned non-object elements, marking all stages fallback");
        Artifacts {
            records: output.structure,
            schema_text: self.or_default_schema(Some(output.schema_text)),
            api_code: or_missing_api_code(Some(output.api_code)),
            app_files: output.app_files,
            stage_log: StageLog::all_fallback(RECONCILED_SUMMARIES),
        }
    }

    fn from_parsed(&self, parsed: ParsedComposite) -> Artifacts {
        let stage_log = StageLog::all_fallback(RECONCILED_SUMMARIES);

        match parsed {
            ParsedComposite::Document(document) => {
                debug!("Raw output read as a whole document");
                Artifacts {
                    records: document.json_data,
                    schema_text: self.or_default_schema(Some(document.db_schema)),
                    api_code: or_missing_api_code(Some(document.api_code)),
                    app_files: document.full_app_files,
                    stage_log,
                }
            }
            ParsedComposite::Sections { sections, rejected } => {
                warn!(reason = %rejected, "Raw output read section by section");
                Artifacts {
                    records: sections.records,
                    schema_text: self.or_default_schema(sections.schema),
                    api_code: or_missing_api_code(sections.api_code),
                    app_files: AppFiles::new()
                        .with_file("app.js", sections.app_js.unwrap_or_default())
                        .with_file("package.json", "{}")
                        .with_file("data.js", ""),
                    stage_log,
                }
            }
        }
    }

    /// One-line CREATE TABLE over the table's fields
    pub fn default_schema(&self) -> String {
        format!(
            "CREATE TABLE {FALLBACK_TABLE} ({});",
            column_definitions(self.fields).join(", ")
        )
    }

    fn or_default_schema(&self, schema: Option<String>) -> String {
        match schema {
            Some(schema) if !schema.trim().is_empty() => schema,
            _ => self.default_schema(),
        }
    }
}

fn or_missing_api_code(api_code: Option<String>) -> String {
    match api_code {
        Some(code) if !code.trim().is_empty() => code,
        _ => MISSING_API_CODE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::result::{StageEntry, StageName};
    use serde_json::json;

    fn fields() -> FieldSet {
        FieldSet::from_columns(["Name", "Email"])
    }

    #[test]
    fn test_composite_passthrough() {
        let output = ChainOutput {
            structure: vec![json!({"name": "A"})],
            schema_text: "CREATE TABLE t (name TEXT PRIMARY KEY);".to_string(),
            api_code: "// route".to_string(),
            app_files: AppFiles::new().with_file("app.js", "x"),
            stage_log: StageLog::new(
                StageEntry::complete(StageName::Structure, "ok"),
                StageEntry::complete(StageName::Schema, "ok"),
                StageEntry::complete(StageName::Code, "ok"),
            ),
        };
        let fields = fields();
        let artifacts =
            OutputReconciler::new(&fields).reconcile(ReconcileInput::Composite(output.clone()));
        assert_eq!(artifacts, output.into_artifacts());
        assert!(artifacts.stage_log.is_all_complete());
    }

    #[test]
    fn test_phase_one_document() {
        let text = r#"{"jsonData":[{"name":"A"}],"dbSchema":"CREATE TABLE x (name TEXT);","apiCode":"// api","fullAppFiles":{"app.js":"a"}}"#;
        let ParsedComposite::Document(document) = OutputReconciler::parse_raw(text) else {
            panic!("expected document");
        };
        assert_eq!(document.json_data, vec![json!({"name": "A"})]);
        assert_eq!(document.full_app_files.get("app.js"), Some("a"));

        let fields = fields();
        let artifacts = OutputReconciler::new(&fields).reconcile(ReconcileInput::Raw(text.into()));
        assert_eq!(artifacts.schema_text, "CREATE TABLE x (name TEXT);");
        assert_eq!(artifacts.api_code, "// api");
        assert!(artifacts.stage_log.is_all_fallback());
    }

    #[test]
    fn test_phase_one_missing_keys_default() {
        let fields = fields();
        let artifacts =
            OutputReconciler::new(&fields).reconcile(ReconcileInput::Raw(r#"{"jsonData": []}"#.into()));
        assert_eq!(
            artifacts.schema_text,
            "CREATE TABLE customers (name VARCHAR(255), email VARCHAR(255));"
        );
        assert_eq!(artifacts.api_code, MISSING_API_CODE);
        assert!(artifacts.app_files.is_empty());
    }

    #[test]
    fn test_phase_one_rejections() {
        assert!(matches!(
            parse_document("not json"),
            Err(ReconcileError::NotJson(_))
        ));
        assert!(matches!(
            parse_document("[1, 2]"),
            Err(ReconcileError::NotAnObject)
        ));
        assert!(matches!(
            parse_document(r#"{"jsonData": "oops"}"#),
            Err(ReconcileError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn test_phase_two_sections() {
        let text = "```json\n[{\"name\": \"A\"}]\n```\n---\n```sql\nCREATE TABLE t (name TEXT);\n```\n---\nexport async function GET() {}\n---\n```js\nconst app = express();\n```";
        let ParsedComposite::Sections { sections, rejected } = OutputReconciler::parse_raw(text)
        else {
            panic!("expected sections");
        };
        assert!(matches!(rejected, ReconcileError::NotAnObject | ReconcileError::NotJson(_)));
        assert_eq!(sections.records, vec![json!({"name": "A"})]);
        assert_eq!(sections.schema.as_deref(), Some("CREATE TABLE t (name TEXT);"));
        assert_eq!(sections.api_code.as_deref(), Some("export async function GET() {}"));
        assert_eq!(sections.app_js.as_deref(), Some("const app = express();"));

        let fields = fields();
        let artifacts = OutputReconciler::new(&fields).reconcile(ReconcileInput::Raw(text.into()));
        assert_eq!(artifacts.app_files.get("app.js"), Some("const app = express();"));
        assert_eq!(artifacts.app_files.get("package.json"), Some("{}"));
        assert_eq!(artifacts.app_files.get("data.js"), Some(""));
        assert!(artifacts.stage_log.is_all_fallback());
        assert_eq!(artifacts.stage_log.entries()[2].summary, "Fallback optimization");
    }

    #[test]
    fn test_phase_two_defaults() {
        let fields = fields();
        let artifacts =
            OutputReconciler::new(&fields).reconcile(ReconcileInput::Raw("garbage".into()));
        assert!(artifacts.records.is_empty());
        assert_eq!(
            artifacts.schema_text,
            "CREATE TABLE customers (name VARCHAR(255), email VARCHAR(255));"
        );
        assert_eq!(artifacts.api_code, MISSING_API_CODE);
        assert_eq!(artifacts.app_files.get("app.js"), Some(""));
    }

    #[test]
    fn test_phase_two_non_array_records() {
        let sections = RawSections::split("{\"a\": 1}\n---\nschema");
        assert!(sections.records.is_empty());
        assert_eq!(sections.schema.as_deref(), Some("schema"));
        assert_eq!(sections.api_code, None);
    }

    #[test]
    fn test_irregular_composite_keeps_fields() {
        let schema = "-- --- legacy export ---\nCREATE TABLE c (id INT PRIMARY KEY);";
        let output = ChainOutput {
            structure: vec![json!(1), json!(2)],
            schema_text: schema.to_string(),
            api_code: "// --- routes ---\nexport async function GET() {}".to_string(),
            app_files: AppFiles::new().with_file("app.js", "listen()"),
            stage_log: StageLog::new(
                StageEntry::complete(StageName::Structure, "ok"),
                StageEntry::complete(StageName::Schema, "ok"),
                StageEntry::complete(StageName::Code, "ok"),
            ),
        };
        let fields = fields();
        let artifacts =
            OutputReconciler::new(&fields).reconcile(ReconcileInput::Composite(output));

        assert_eq!(artifacts.records, vec![json!(1), json!(2)]);
        assert_eq!(artifacts.schema_text, schema);
        assert_eq!(
            artifacts.api_code,
            "// --- routes ---\nexport async function GET() {}"
        );
        assert_eq!(artifacts.app_files.get("app.js"), Some("listen()"));
        assert!(artifacts.stage_log.is_all_fallback());
        assert_eq!(artifacts.stage_log.entries()[0].summary, "Fallback parse");
    }

    #[test]
    fn test_irregular_composite_blank_fields_default() {
        let output = ChainOutput {
            structure: vec![json!("x")],
            schema_text: String::new(),
            api_code: " ".to_string(),
            app_files: AppFiles::new(),
            stage_log: StageLog::all_fallback(["a", "b", "c"]),
        };
        let fields = fields();
        let artifacts =
            OutputReconciler::new(&fields).reconcile(ReconcileInput::Composite(output));
        assert_eq!(
            artifacts.schema_text,
            "CREATE TABLE customers (name VARCHAR(255), email VARCHAR(255));"
        );
        assert_eq!(artifacts.api_code, MISSING_API_CODE);
    }

    #[test]
    fn test_phase_one_fences_inside_strings() {
        let text = r#"{"jsonData":[],"dbSchema":"CREATE TABLE x (id INT);","apiCode":"// ```js\nGET()```"}"#;
        let ParsedComposite::Document(document) = OutputReconciler::parse_raw(text) else {
            panic!("expected document");
        };
        assert_eq!(document.api_code, "// ```js\nGET()```");
    }
}

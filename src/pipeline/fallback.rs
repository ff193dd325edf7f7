//! Deterministic artifacts built from ingested records alone.
//!
//! Used whenever the generation chain fails. Nothing here calls out to a
//! generation service, so the same table always yields the same artifacts.

use serde_json::{Value, json};

use super::result::{AppFiles, Artifacts, StageLog};
use crate::ingest::{FieldSet, Record, record_to_json};

/// Table name used by synthesized schemas and endpoints
pub const FALLBACK_TABLE: &str = "customers";

/// Column type given to every synthesized column
pub const FALLBACK_COLUMN_TYPE: &str = "VARCHAR(255)";

/// Port the synthesized service listens on
pub const FALLBACK_PORT: u16 = 3001;

/// Stage summaries for a synthesized result
pub const FALLBACK_SUMMARIES: [&str; 3] = [
    "Fallback: Basic CSV parse",
    "Fallback: Simple schema",
    "Fallback: Basic code",
];

/// Column definitions, one per field: lower-cased name and the generic type
pub(crate) fn column_definitions(fields: &FieldSet) -> Vec<String> {
    fields
        .iter()
        .map(|field| format!("{} {}", field.to_lowercase(), FALLBACK_COLUMN_TYPE))
        .collect()
}

/// Synthesizer for the canonical artifacts without a generator.
pub struct FallbackSynthesizer;

impl FallbackSynthesizer {
    /// Build every artifact from the field set and records.
    ///
    /// # Arguments
    ///
    /// * `fields` - Header field names, in order
    /// * `records` - Ingested records
    ///
    /// # Returns
    ///
    /// Artifacts whose stage log marks every stage as fallback.
    ///
    /// # Example
    ///
    /// ```rust
    /// use legacy_modernizer::ingest::ingest;
    /// use legacy_modernizer::pipeline::FallbackSynthesizer;
    ///
    /// let table = ingest("name,email\nA,a@x.com").unwrap();
    /// let artifacts = FallbackSynthesizer::synthesize(&table.fields, &table.records);
    /// assert!(artifacts.schema_text.contains("email VARCHAR(255)"));
    /// assert!(artifacts.stage_log.is_all_fallback());
    /// ```
    pub fn synthesize(fields: &FieldSet, records: &[Record]) -> Artifacts {
        let records: Vec<Value> = records.iter().map(record_to_json).collect();
        let pretty = format!("{:#}", Value::Array(records.clone()));

        Artifacts {
            schema_text: Self::schema(fields),
            api_code: Self::api_code(&pretty),
            app_files: Self::app_files(&pretty),
            records,
            stage_log: StageLog::all_fallback(FALLBACK_SUMMARIES),
        }
    }

    /// Multi-line CREATE TABLE naming every field
    pub fn schema(fields: &FieldSet) -> String {
        let columns = column_definitions(fields)
            .into_iter()
            .map(|def| format!("  {def}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE {FALLBACK_TABLE} (\n{columns}\n);")
    }

    /// GET route returning the records literally
    fn api_code(pretty_records: &str) -> String {
        format!(
            "// src/app/api/{FALLBACK_TABLE}/route.ts\n\
             import {{ NextResponse }} from 'next/server';\n\
             export async function GET() {{\n  \
             const data = {pretty_records};\n  \
             return NextResponse.json(data);\n\
             }}"
        )
    }

    /// `app.js`, `package.json` and `data.js`
    fn app_files(pretty_records: &str) -> AppFiles {
        let app_js = format!(
            "const express = require('express');\n\
             const app = express();\n\
             app.use(express.json());\n\
             app.get('/{FALLBACK_TABLE}', (req, res) => res.json({pretty_records}));\n\
             app.listen({FALLBACK_PORT}, () => console.log('Microservice running on port {FALLBACK_PORT}'));"
        );

        let package_json = json!({
            "name": "modernized-microservice",
            "version": "1.0.0",
            "dependencies": { "express": "^4.18.0" },
            "scripts": { "start": "node app.js" }
        })
        .to_string();

        let data_js = format!("module.exports = {pretty_records};");

        AppFiles::new()
            .with_file("app.js", app_js)
            .with_file("package.json", package_json)
            .with_file("data.js", data_js)
    }
}

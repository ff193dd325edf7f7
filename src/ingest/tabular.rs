//! Delimited text parsing into field sets and records

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::IngestConfig;
use super::error::{IngestError, IngestResult};

/// Quote character stripped from every token
const QUOTE: char = '"';

/// A record: field name to string value, in field set order
pub type Record = IndexMap<String, String>;

/// Ordered, distinct field names taken from the header line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(Vec<String>);

impl FieldSet {
    /// Build a field set from header tokens, keeping the first position of duplicates
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if !names.contains(&column) {
                names.push(column);
            }
        }
        Self(names)
    }

    /// Field names in header order
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the field set has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over field names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// The outcome of ingesting one upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestedTable {
    /// Field names from the header line
    pub fields: FieldSet,
    /// One record per non-blank data line
    pub records: Vec<Record>,
    /// Header plus the first few data lines, verbatim
    pub sample: String,
}

impl IngestedTable {
    /// Number of ingested records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Records as JSON objects, preserving field order
    pub fn records_json(&self) -> Vec<Value> {
        self.records.iter().map(record_to_json).collect()
    }
}

/// Convert a record into a JSON object with string values
pub fn record_to_json(record: &Record) -> Value {
    Value::Object(
        record
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Parser for delimited legacy exports
#[derive(Debug, Clone, Default)]
pub struct TabularIngestor {
    config: IngestConfig,
}

impl TabularIngestor {
    /// Create an ingestor with the given configuration
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Get the active configuration
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Decode raw upload bytes as UTF-8 and ingest them
    pub fn ingest_bytes(&self, bytes: &[u8]) -> IngestResult<IngestedTable> {
        let text = std::str::from_utf8(bytes)?;
        self.ingest(text)
    }

    /// Ingest decoded text
    pub fn ingest(&self, text: &str) -> IngestResult<IngestedTable> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(IngestError::Empty);
        }

        let raw_lines: Vec<&str> = trimmed.split('\n').collect();
        let mut lines = raw_lines
            .iter()
            .copied()
            .map(|line| line.strip_suffix('\r').unwrap_or(line));

        let header = lines.next().ok_or(IngestError::Empty)?;
        let columns = self.split_line(header);
        let fields = FieldSet::from_columns(columns.iter().cloned());

        let data_lines: Vec<&str> = lines.filter(|line| !line.trim().is_empty()).collect();

        let records = data_lines
            .iter()
            .map(|line| {
                let values = self.split_line(line);
                let mut record = Record::with_capacity(fields.len());
                // Later duplicate columns overwrite the value but keep the first position
                for (index, column) in columns.iter().enumerate() {
                    let value = values.get(index).cloned().unwrap_or_default();
                    record.insert(column.clone(), value);
                }
                record
            })
            .collect::<Vec<_>>();

        // Verbatim leading lines, blank lines and carriage returns included
        let sample = raw_lines[..raw_lines.len().min(self.config.sample_lines)].join("\n");

        tracing::debug!(
            fields = fields.len(),
            records = records.len(),
            "Ingested delimited input"
        );

        Ok(IngestedTable {
            fields,
            records,
            sample,
        })
    }

    /// Split one line into trimmed, quote-stripped tokens
    fn split_line(&self, line: &str) -> Vec<String> {
        line.split(self.config.delimiter)
            .map(|token| token.trim().replace(QUOTE, ""))
            .collect()
    }
}

/// Ingest text with the default configuration
pub fn ingest(text: &str) -> IngestResult<IngestedTable> {
    TabularIngestor::default().ingest(text)
}

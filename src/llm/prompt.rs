//! Prompt templates for the modernization chain
//!
//! This module provides the prompt templates for each of the three chain
//! stages and the helpers that clean markdown fences out of completions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Prompt template for the structure stage
pub const STRUCTURE_PROMPT_TEMPLATE: &str = r#"You are a data migration specialist converting a legacy AS/400 tabular export into JSON.

## Export Sample
```
{sample}
```

## Rules
1. Produce one JSON object per data row
2. Use the header names as keys
3. Keep every value as it appears in the sample

## Output
Return ONLY a valid JSON array of objects. Do not include any explanation or markdown formatting."#;

/// Prompt template for the schema stage
pub const SCHEMA_PROMPT_TEMPLATE: &str = r#"You are a database designer. Write a PostgreSQL CREATE TABLE statement for records shaped like these:

```json
{records}
```

## Rules
1. Give every column an explicit type
2. Declare a PRIMARY KEY

## Output
Return ONLY the SQL statement."#;

/// Prompt template for the code stage
pub const CODE_PROMPT_TEMPLATE: &str = r#"You are a backend engineer modernizing a legacy data export.

## Records
```json
{records}
```

## Table Schema
```sql
{schema}
```

## Task
1. Write a Next.js GET route that serves these records
2. Write a small deployable Node.js Express service for them with the files "app.js", "package.json" and "data.js"

## Output
Return ONLY a JSON object with the keys:
- "apiCode": the Next.js route source as a string
- "fullAppFiles": an object mapping each file name to its contents as a string
Keep the code concise but runnable."#;

/// Opening or closing fence marker, with an optional language tag
static FENCE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[\w-]*\n?").expect("fence pattern is valid"));

/// Build the structure stage prompt around the export sample
pub fn structure_prompt(sample: &str) -> String {
    STRUCTURE_PROMPT_TEMPLATE.replace("{sample}", sample)
}

/// Build the schema stage prompt around a JSON preview of the records
pub fn schema_prompt(records_json: &str) -> String {
    SCHEMA_PROMPT_TEMPLATE.replace("{records}", records_json)
}

/// Build the code stage prompt from the full records and the schema text
pub fn code_prompt(records_json: &str, schema: &str) -> String {
    CODE_PROMPT_TEMPLATE
        .replace("{records}", records_json)
        .replace("{schema}", schema)
}

/// Extract the body of the first fenced block, or the trimmed text when unfenced
///
/// Handles:
/// - Pure text
/// - Text wrapped in a ```lang fenced block
/// - A fenced block with leading/trailing prose
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        let after_marker = start + 3;
        // Skip language identifier if present
        let content_start = trimmed[after_marker..]
            .find('\n')
            .map(|n| after_marker + n + 1)
            .unwrap_or(after_marker);
        if let Some(end) = trimmed[content_start..].find("```") {
            return trimmed[content_start..content_start + end].trim();
        }
    }

    trimmed
}

/// Parse a completion as JSON, unwrapping a fenced block only when needed
///
/// The trimmed completion is tried first so fences quoted inside string
/// values survive. On failure the body of the first fenced block is tried.
pub fn parse_json_completion(response: &str) -> serde_json::Result<Value> {
    let trimmed = response.trim();
    serde_json::from_str(trimmed).or_else(|err| {
        let inner = strip_code_fence(trimmed);
        if inner.len() == trimmed.len() {
            Err(err)
        } else {
            serde_json::from_str(inner)
        }
    })
}

/// Remove every fence marker from a text section and trim it
pub fn strip_fence_markers(section: &str) -> String {
    FENCE_MARKER.replace_all(section.trim(), "").trim().to_string()
}

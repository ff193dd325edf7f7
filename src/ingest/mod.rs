//! Delimited text ingestion
//!
//! Turns a legacy tabular export (comma separated unless configured otherwise)
//! into an ordered field set, one uniform record per data line, and a short
//! verbatim sample that later serves as prompt context.
//!
//! # Example
//!
//! ```rust
//! use legacy_modernizer::ingest::ingest;
//!
//! let table = ingest("name,email\nA,a@x.com\nB,b@y.com").unwrap();
//! assert_eq!(table.fields.names(), ["name", "email"]);
//! assert_eq!(table.records.len(), 2);
//! assert_eq!(table.records[1]["email"], "b@y.com");
//! ```
//!
//! # Known limitation
//!
//! Quote characters are stripped from every token, but a delimiter inside a
//! quoted value still splits the value.

mod config;
mod error;
mod tabular;

pub use config::IngestConfig;
pub use error::{IngestError, IngestResult};
pub use tabular::{FieldSet, IngestedTable, Record, TabularIngestor, ingest, record_to_json};

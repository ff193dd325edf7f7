//! Ingestion configuration

use serde::{Deserialize, Serialize};

/// Configuration for delimited text ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Total lines kept in the sample (header included)
    #[serde(default = "default_sample_lines")]
    pub sample_lines: usize,
}

fn default_delimiter() -> char {
    ','
}

fn default_sample_lines() -> usize {
    5
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            sample_lines: default_sample_lines(),
        }
    }
}

impl IngestConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the number of sample lines; the header is always kept
    pub fn with_sample_lines(mut self, lines: usize) -> Self {
        self.sample_lines = lines.max(1);
        self
    }
}

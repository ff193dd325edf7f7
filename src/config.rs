//! Top-level configuration
//!
//! Every section has serde defaults, so an empty TOML file (or no file at
//! all) yields a working configuration with generation disabled until a
//! credential is supplied.
//!
//! ```toml
//! [generation]
//! model = "grok-4"
//!
//! [stages.code]
//! temperature = 0.3
//! max_output_tokens = 2000
//! timeout_ms = 15000
//!
//! [ingest]
//! delimiter = ";"
//!
//! [server]
//! bind = "0.0.0.0:3000"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::IngestConfig;
use crate::llm::GenerationConfig;
use crate::pipeline::StageSettings;

/// Environment variable holding the generation credential
pub const ENV_API_KEY: &str = "XAI_API_KEY";
/// Environment variable overriding the model identifier
pub const ENV_MODEL: &str = "MODERNIZER_MODEL";
/// Environment variable overriding the endpoint URL
pub const ENV_ENDPOINT: &str = "MODERNIZER_ENDPOINT";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// HTTP service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Complete modernizer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModernizerConfig {
    /// Generation service connection
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Per-stage generation parameters
    #[serde(default)]
    pub stages: StageSettings,

    /// Delimited text parsing
    #[serde(default)]
    pub ingest: IngestConfig,

    /// HTTP service
    #[serde(default)]
    pub server: ServerConfig,
}

impl ModernizerConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ModernizerConfig = toml::from_str(content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Set the generation connection
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Set per-stage parameters
    pub fn with_stages(mut self, stages: StageSettings) -> Self {
        self.stages = stages;
        self
    }

    /// Set ingestion settings
    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    /// Set HTTP service settings
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Apply overrides from a variable lookup
    ///
    /// Blank values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(ENV_API_KEY) {
            self.generation.api_key = Some(key);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.generation.model = model;
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.generation.endpoint = endpoint;
        }
        self
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.generation.enabled && self.generation.endpoint.trim().is_empty() {
            return Err("generation.endpoint must not be empty".to_string());
        }
        if self.generation.enabled && self.generation.model.trim().is_empty() {
            return Err("generation.model must not be empty".to_string());
        }

        self.stages.validate()?;

        if self.ingest.sample_lines == 0 {
            return Err("ingest.sample_lines must be at least 1".to_string());
        }
        if self.ingest.delimiter == '"' || self.ingest.delimiter == '\n' {
            return Err(format!(
                "ingest.delimiter {:?} is not allowed",
                self.ingest.delimiter
            ));
        }

        if self.server.max_upload_bytes == 0 {
            return Err("server.max_upload_bytes must be greater than 0".to_string());
        }

        Ok(())
    }
}

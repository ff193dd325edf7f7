//! Text generation for the modernization chain
//!
//! This module provides the single call contract every chain stage uses to
//! reach the external text-generation service.
//!
//! # Example
//!
//! ```ignore
//! use legacy_modernizer::llm::{
//!     ChatCompletionsClient, GenerationClient, GenerationConfig, GenerationParams,
//! };
//!
//! let config = GenerationConfig::with_api_key(std::env::var("XAI_API_KEY")?);
//! let client = ChatCompletionsClient::new(&config);
//!
//! let params = GenerationParams::new(0.2, 300, 10_000);
//! let sql = client.generate("Write a CREATE TABLE for...", &params).await?;
//! ```
//!
//! Calls are never retried; a failed call fails the enclosing stage.

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod prompt;

// Re-export main types
pub use chat::ChatCompletionsClient;
pub use client::{GenerationClient, GenerationParams};
pub use config::GenerationConfig;
pub use error::{GenerationError, GenerationResult};
pub use prompt::{parse_json_completion, strip_code_fence, strip_fence_markers};

#[cfg(test)]
pub use client::ScriptedClient;

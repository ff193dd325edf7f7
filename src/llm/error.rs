//! Error types for generation calls
//!
//! Every failure of a single call to the external text-generation service
//! maps to one `GenerationError`. Calls are never retried, so the variant
//! only tells the caller what went wrong, not whether to try again.

use thiserror::Error;

/// Errors that can occur during a generation call
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Failed to reach the generation service
    #[error("Failed to connect to generation service: {0}")]
    ConnectionError(String),

    /// Request timeout
    #[error("Generation request timed out after {0} ms")]
    Timeout(u64),

    /// Non-success HTTP status from the service
    #[error("Generation service returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Invalid generation response: {0}")]
    InvalidResponse(String),

    /// The service answered without any completion text
    #[error("Generation service returned an empty completion")]
    EmptyCompletion,

    /// Configuration error
    #[error("Generation configuration error: {0}")]
    ConfigError(String),
}

/// Result type for generation calls
pub type GenerationResult<T> = Result<T, GenerationError>;

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::InvalidResponse(err.to_string())
    }
}

impl GenerationError {
    /// Upstream HTTP status, when the service answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            GenerationError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get a user-friendly error message for operators
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::ConnectionError(msg) => {
                format!(
                    "Failed to connect to generation service: {msg}\n\n\
                    Hints:\n\
                    - Check network access to the endpoint\n\
                    - Verify the configured endpoint URL"
                )
            }
            GenerationError::Timeout(ms) => {
                format!(
                    "Generation request timed out after {ms} ms.\n\n\
                    Hint: raise the stage timeout_ms in the configuration file."
                )
            }
            GenerationError::UpstreamStatus { status, .. } if *status == 401 || *status == 403 => {
                format!(
                    "{self}\n\n\
                    Hint: check the XAI_API_KEY credential."
                )
            }
            GenerationError::ConfigError(msg) => {
                format!(
                    "Generation configuration error: {msg}\n\n\
                    Hint: set XAI_API_KEY or disable generation in the configuration file."
                )
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GenerationError::ConnectionError("Connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to connect to generation service: Connection refused"
        );

        let err = GenerationError::Timeout(10_000);
        assert_eq!(err.to_string(), "Generation request timed out after 10000 ms");

        let err = GenerationError::UpstreamStatus {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Generation service returned HTTP 503: overloaded"
        );
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: GenerationError = json_err.into();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_user_message_hints() {
        let err = GenerationError::UpstreamStatus {
            status: 401,
            body: String::new(),
        };
        assert!(err.user_message().contains("XAI_API_KEY"));

        let err = GenerationError::Timeout(15_000);
        assert!(err.user_message().contains("timeout_ms"));

        let err = GenerationError::EmptyCompletion;
        assert_eq!(err.user_message(), err.to_string());
    }
}

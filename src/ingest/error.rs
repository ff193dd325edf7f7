//! Error types for ingestion

use thiserror::Error;

/// Errors that can occur while ingesting an uploaded export
#[derive(Error, Debug)]
pub enum IngestError {
    /// Nothing but whitespace was uploaded
    #[error("Input is empty: no header line found")]
    Empty,

    /// The upload is not text
    #[error("Input is not valid UTF-8 text: {0}")]
    Decode(#[from] std::str::Utf8Error),
}

/// Result type for ingestion
pub type IngestResult<T> = Result<T, IngestError>;

impl IngestError {
    /// Get a user-friendly error message with a hint for the uploader
    pub fn user_message(&self) -> String {
        match self {
            IngestError::Empty => format!(
                "{self}\n\nHint: upload a delimited text export whose first line names the columns."
            ),
            IngestError::Decode(_) => format!(
                "{self}\n\nHint: re-export the file as UTF-8 encoded text."
            ),
        }
    }
}

//! Error types for the media module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching metadata or downloading media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// A required request parameter is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// The extractor process could not be spawned at all.
    #[error("Failed to start {program}: {source}")]
    ProcessStart {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The extractor ran and failed.
    #[error("{summary}")]
    Extraction {
        summary: String,
        stderr: Option<String>,
    },

    /// The extractor was killed after exceeding its time budget.
    #[error("{operation} timed out after {timeout_secs} seconds")]
    Timeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    /// The extractor exited cleanly but its output was not what we expected.
    #[error("Failed to parse extractor output: {reason}")]
    Parse { reason: String },

    /// The produced file could not be handed to the caller.
    #[error("Failed to deliver file: {0}")]
    Delivery(#[source] std::io::Error),

    /// I/O error around the extractor run (temp dir, pipes).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an extraction error with the captured stderr.
    pub fn extraction(summary: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Extraction {
            summary: summary.into(),
            stderr,
        }
    }

    /// Creates a parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::ProcessStart { .. } => "process_start",
            Self::Extraction { .. } => "extraction",
            Self::Timeout { .. } => "timeout",
            Self::Parse { .. } => "parse",
            Self::Delivery(_) => "delivery",
            Self::Io(_) => "io",
        }
    }
}

use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Anything that reaches the polling loop terminates it; see `CvProcessor::run`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open PDF {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] csv::Error),

    #[error("Failed to replace spreadsheet file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

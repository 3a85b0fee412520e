use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ConftreeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConftreeError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{backend} backend does not support {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("Connection to {endpoint} failed: {reason}")]
    Connectivity { endpoint: String, reason: String },

    #[error("Cannot build tree at '{path}': {reason}")]
    Construction { path: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid backend URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl ConftreeError {
    /// True for the errors that mean "nothing there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConftreeError::NotFound(_))
    }
}

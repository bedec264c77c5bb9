//! Error types shared by the composer library.
//!
//! Every service returns [`Result`]; the binary wraps these in `anyhow` at the
//! command boundary, where [`crate::ui::notifications`] renders them.

use crate::models::OperatingSystem;
use crate::services::validation::ValidationErrors;
use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// Errors that can occur while composing or patching a workspace
#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },

    #[error("Configuration is invalid: {}", summarize(.0))]
    Validation(ValidationErrors),

    #[error("{context}: {source}")]
    Io { context: String, source: io::Error },

    #[error("File '{0}' already exists")]
    Conflict(String),

    #[error("{0}")]
    Assertion(String),

    #[error("{operation} is not supported on {os}")]
    UnsupportedOperation {
        os: OperatingSystem,
        operation: &'static str,
    },

    #[error("Invalid file name '{0}'")]
    InvalidFileName(String),

    #[error("Invalid version number '{0}'")]
    InvalidVersion(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("No workspace is open")]
    NoWorkspace,
}

impl ComposerError {
    /// Wrap an I/O error with a description of what was attempted
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn unsupported(os: OperatingSystem, operation: &'static str) -> Self {
        Self::UnsupportedOperation { os, operation }
    }
}

impl From<reqwest::Error> for ComposerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Download(err.to_string())
    }
}

fn summarize(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|(key, message)| format!("{}: {}", key, message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ComposerError>;

//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Event source error
    #[error("Failed to open event source '{path}': {message}")]
    Source { path: String, message: String },

    /// Observability initialization error
    #[error("Failed to initialize observability: {message}")]
    Observability { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn source(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn observability(message: impl Into<String>) -> Self {
        Self::Observability {
            message: message.into(),
        }
    }
}

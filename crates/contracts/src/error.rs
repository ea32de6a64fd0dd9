//! Layered error definitions
//!
//! Categorized by source: config / queue / transport / dispatch

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum SinkError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse { message: String },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Queue Errors =====
    /// Enqueue refused under the reject / drop-newest overflow policy
    #[error("memory queue is full: depth={depth}, max={max}")]
    CapacityExceeded { depth: usize, max: usize },

    /// Event discarded after exhausting its delivery retries
    #[error("event '{id}' failed permanently after {attempts} attempts")]
    RetriesExhausted { id: String, attempts: u32 },

    // ===== Transport Errors =====
    /// No downstream transport configured
    #[error("no queue transport configured")]
    TransportMissing,

    /// Transport construction failed
    #[error("failed to initialize transport '{transport}': {message}")]
    TransportInit { transport: String, message: String },

    /// A downstream send failed; eligible for retry on the buffered path
    #[error("transport '{transport}' send error: {message}")]
    SendFailed { transport: String, message: String },

    // ===== Dispatch Errors =====
    /// Direct-path deadline expired before the downstream call completed
    #[error("direct send timed out after {elapsed_ms}ms")]
    DirectSendTimeout { elapsed_ms: u64 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl SinkError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create transport construction error
    pub fn transport_init(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportInit {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create transport send error
    pub fn send_failed(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SendFailed {
            transport: transport.into(),
            message: message.into(),
        }
    }
}

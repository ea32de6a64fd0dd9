//! Blueprint parsing for TOML and JSON formats.

use contracts::{SinkBlueprint, SinkError};

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document
    Toml,
    /// JSON document
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a blueprint document
pub(crate) fn parse(content: &str, format: ConfigFormat) -> Result<SinkBlueprint, SinkError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content)
            .map_err(|e| SinkError::config_parse(format!("TOML parse error: {e}"))),
        ConfigFormat::Json => serde_json::from_str(content)
            .map_err(|e| SinkError::config_parse(format!("JSON parse error: {e}"))),
    }
}

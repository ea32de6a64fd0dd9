//! FileTransport - appends events as NDJSON to disk

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use contracts::{PushReceipt, QueueTransport, SinkError};
use serde_json::Value;
use tracing::{debug, instrument};

/// Configuration for FileTransport
#[derive(Debug, Clone)]
pub struct FileTransportConfig {
    /// Target NDJSON file
    pub path: PathBuf,
}

impl FileTransportConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./events.ndjson"));

        Self { path }
    }
}

/// Transport that appends one JSON line per event
pub struct FileTransport {
    name: String,
    config: FileTransportConfig,
    file: Mutex<File>,
}

impl FileTransport {
    /// Create a new FileTransport, creating parent directories as needed
    pub fn new(name: impl Into<String>, config: FileTransportConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        let name = name.into();
        debug!(transport = %name, path = %config.path.display(), "file transport opened");

        Ok(Self {
            name,
            config,
            file: Mutex::new(file),
        })
    }

    /// Create from params map (for the factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, SinkError> {
        Self::new(name, FileTransportConfig::from_params(params))
            .map_err(|e| SinkError::transport_init("file", e.to_string()))
    }

    fn file(&self) -> MutexGuard<'_, File> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl QueueTransport for FileTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_transport_push",
        skip(self, event),
        fields(transport = %self.name)
    )]
    async fn push(&self, event: Value) -> Result<PushReceipt, SinkError> {
        let line = serde_json::to_string(&event)
            .map_err(|e| SinkError::send_failed(&self.name, e.to_string()))?;

        writeln!(self.file(), "{line}")?;

        Ok(PushReceipt {
            transport: self.name.clone(),
            accepted_at: Utc::now().to_rfc3339(),
            detail: Some(self.config.path.display().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_transport_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let config = FileTransportConfig { path: path.clone() };

        let transport = FileTransport::new("test_file", config).unwrap();
        transport
            .push(json!({"event": "playing", "sessionId": "s1"}))
            .await
            .unwrap();
        transport
            .push(json!({"event": "paused", "sessionId": "s1"}))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "playing");
    }

    #[tokio::test]
    async fn test_file_transport_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/events.ndjson");

        let mut params = HashMap::new();
        params.insert("path".to_string(), path.display().to_string());

        let transport = FileTransport::from_params("test_file", &params).unwrap();
        transport.push(json!({"event": "init"})).await.unwrap();

        assert!(path.exists());
    }
}

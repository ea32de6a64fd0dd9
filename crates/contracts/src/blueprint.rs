//! Service blueprint - the root configuration document.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{DispatchOptions, QueueOptions};

/// Ingest source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// NDJSON event source path (stdin when absent)
    pub source: Option<PathBuf>,

    /// Reader-to-dispatch channel capacity
    pub channel_capacity: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            source: None,
            channel_capacity: 100,
        }
    }
}

/// Root configuration for the telemetry sink service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkBlueprint {
    /// Memory queue section
    pub queue: QueueOptions,

    /// Dispatch section
    pub dispatch: DispatchOptions,

    /// Ingest section
    pub ingest: IngestOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let blueprint: SinkBlueprint = serde_json::from_str("{}").unwrap();
        assert_eq!(blueprint.queue.max_size, 10_000);
        assert!(blueprint.dispatch.transport.is_none());
        assert!(blueprint.ingest.source.is_none());
        assert_eq!(blueprint.ingest.channel_capacity, 100);
    }
}

//! QueueTransport trait - downstream delivery interface
//!
//! Transports are cached as trait objects by the adapter registry, so the
//! trait must stay object-safe.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{PushReceipt, SinkError, TransportKind};

/// Downstream delivery trait
///
/// This is the entire contract the buffering engine requires from the
/// transport layer.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Transport name (used for logging and receipts)
    fn name(&self) -> &str;

    /// Push one event to the durable downstream queue
    ///
    /// # Errors
    /// Returns a send error; buffered callers retry, direct callers surface it.
    async fn push(&self, event: Value) -> Result<PushReceipt, SinkError>;
}

/// Constructs transports on demand for the adapter registry
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Build a transport of the given kind
    ///
    /// # Errors
    /// Returns a construction error; the registry leaves the slot empty so a
    /// later resolve can retry.
    async fn build(
        &self,
        kind: TransportKind,
        params: &HashMap<String, String>,
    ) -> Result<Arc<dyn QueueTransport>, SinkError>;
}

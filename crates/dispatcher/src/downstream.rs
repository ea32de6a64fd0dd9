//! DownstreamSender - resolves the configured transport and delivers events.
//!
//! Shared by the drain path (as the queue's one consumer) and the direct
//! path. Missing configuration surfaces as an error here so buffered drains
//! feed the retry-or-give-up path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    DispatchOptions, DrainConsumer, PushReceipt, QueuedEvent, SinkError,
};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::registry::AdapterRegistry;

/// Push latency above which a warning is escalated
const SLOW_PUSH_WARN: Duration = Duration::from_secs(5);
/// Push latency noted at debug level
const SLOW_PUSH_NOTE: Duration = Duration::from_secs(2);

/// Delivery arm shared by the drain path and the direct path
pub struct DownstreamSender {
    registry: Arc<AdapterRegistry>,
    options: DispatchOptions,
}

impl DownstreamSender {
    /// Create a sender against the shared registry
    pub fn new(options: DispatchOptions, registry: Arc<AdapterRegistry>) -> Self {
        Self { registry, options }
    }

    /// Deliver one event through the configured transport
    ///
    /// # Errors
    /// `TransportMissing` when no transport kind is configured; construction
    /// and send failures otherwise.
    #[instrument(name = "downstream_deliver", skip(self, payload))]
    pub async fn deliver(&self, payload: Value) -> Result<PushReceipt, SinkError> {
        let kind = self.options.transport.ok_or(SinkError::TransportMissing)?;
        let transport = self
            .registry
            .resolve(kind, &self.options.transport_params)
            .await?;

        let started = Instant::now();
        let receipt = transport.push(payload).await?;
        let elapsed = started.elapsed();

        debug!(
            transport = %kind,
            elapsed_ms = elapsed.as_millis() as u64,
            "downstream push completed"
        );
        if elapsed > SLOW_PUSH_WARN {
            warn!(
                transport = %kind,
                elapsed_ms = elapsed.as_millis() as u64,
                "queue push took > 5 seconds, downstream may be degraded"
            );
        } else if elapsed > SLOW_PUSH_NOTE {
            debug!(
                transport = %kind,
                elapsed_ms = elapsed.as_millis() as u64,
                "queue push took > 2 seconds"
            );
        }

        Ok(receipt)
    }
}

impl DrainConsumer for DownstreamSender {
    async fn drain(&self, event: &QueuedEvent) -> Result<PushReceipt, SinkError> {
        self.deliver(event.payload.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_deliver_without_transport_fails() {
        let registry = Arc::new(AdapterRegistry::with_default_factory());
        let sender = DownstreamSender::new(DispatchOptions::default(), registry);

        let result = sender.deliver(json!({"event": "playing"})).await;
        assert!(matches!(result, Err(SinkError::TransportMissing)));
    }

    #[tokio::test]
    async fn test_deliver_through_log_transport() {
        let registry = Arc::new(AdapterRegistry::with_default_factory());
        let options = DispatchOptions {
            transport: Some(contracts::TransportKind::Log),
            ..Default::default()
        };
        let sender = DownstreamSender::new(options, registry);

        let receipt = sender
            .deliver(json!({"event": "playing", "sessionId": "s1"}))
            .await
            .unwrap();
        assert_eq!(receipt.transport, "log");
    }
}

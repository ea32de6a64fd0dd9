//! LogTransport - logs event summaries via tracing

use async_trait::async_trait;
use chrono::Utc;
use contracts::{event_name, session_id, PushReceipt, QueueTransport, SinkError};
use serde_json::Value;
use tracing::{info, instrument};

/// Transport that logs accepted events (debugging and demos)
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl QueueTransport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_push",
        skip(self, event),
        fields(transport = %self.name)
    )]
    async fn push(&self, event: Value) -> Result<PushReceipt, SinkError> {
        info!(
            transport = %self.name,
            session_id = session_id(&event).unwrap_or("-"),
            event = event_name(&event).unwrap_or("-"),
            "telemetry event accepted"
        );

        Ok(PushReceipt {
            transport: self.name.clone(),
            accepted_at: Utc::now().to_rfc3339(),
            detail: None,
        })
    }
}

//! Event types flowing between the queue, dispatcher, and transports.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A telemetry event held in the memory queue awaiting delivery
#[derive(Debug, Clone)]
pub struct QueuedEvent {
    /// Queue-assigned id, unique for the queue lifetime
    pub id: String,
    /// Opaque validated event payload
    pub payload: Value,
    /// When the event entered the queue
    pub enqueued_at: Instant,
    /// Delivery attempts that have failed so far
    pub retry_count: u32,
}

impl QueuedEvent {
    /// Create a fresh event with zero retries
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
            enqueued_at: Instant::now(),
            retry_count: 0,
        }
    }

    /// Time spent in the queue so far
    pub fn age(&self) -> Duration {
        self.enqueued_at.elapsed()
    }
}

/// Acknowledgement returned by a successful enqueue
#[derive(Debug, Clone)]
pub struct EnqueueAck {
    /// Queue-assigned event id
    pub id: String,
    /// Buffer depth right after the enqueue
    pub depth: usize,
}

/// Structured acknowledgement from a downstream transport
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReceipt {
    /// Name of the transport that accepted the event
    pub transport: String,
    /// RFC 3339 timestamp of acceptance
    pub accepted_at: String,
    /// Transport-specific detail (target address, file path, ...)
    pub detail: Option<String>,
}

/// Session id carried by a player event, if present
pub fn session_id(event: &Value) -> Option<&str> {
    event.get("sessionId").and_then(Value::as_str)
}

/// Event name carried by a player event, if present
pub fn event_name(event: &Value) -> Option<&str> {
    event.get("event").and_then(Value::as_str)
}

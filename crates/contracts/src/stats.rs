//! Queue health snapshot backing the service's liveness surface.

use serde::Serialize;

/// Read-only memory queue statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    /// Events currently buffered
    pub queue_size: usize,
    /// Configured buffer capacity
    pub max_size: usize,
    /// Whether a drain tick is currently launching a batch
    pub is_processing: bool,
    /// Age of the oldest buffered event in milliseconds (0 when empty)
    pub oldest_event_age_ms: u64,
    /// Downstream sends currently outstanding
    pub active_concurrent_drains: usize,
    /// Cap on outstanding downstream sends
    pub max_concurrent_drains: usize,
    /// Current inter-event pacing delay in milliseconds
    pub current_throttle_delay_ms: u64,
    /// Configured baseline pacing delay in milliseconds
    pub base_throttle_delay_ms: u64,
    /// Rolling average downstream latency in milliseconds (0 when unknown)
    pub average_response_time_ms: u64,
    /// Whether adaptive throttling is enabled
    pub adaptive_throttling: bool,
}

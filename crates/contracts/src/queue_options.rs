//! Memory queue configuration that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Rule applied when an enqueue would exceed capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Evict the earliest buffered event, then accept the new one
    #[default]
    DropOldest,
    /// Refuse the new event (observably identical to `Reject`, kept as a
    /// distinct policy name for configuration compatibility)
    DropNewest,
    /// Refuse the new event with a capacity error
    Reject,
}

/// Memory queue configuration
///
/// Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QueueOptions {
    /// Hard buffer capacity
    #[validate(range(min = 1))]
    pub max_size: usize,

    /// Maximum events pulled per drain tick
    #[validate(range(min = 1))]
    pub batch_size: usize,

    /// Drain timer period in milliseconds
    #[validate(range(min = 1))]
    pub drain_interval_ms: u64,

    /// Failed delivery attempts tolerated before an event is given up
    pub max_retries: u32,

    /// Overflow policy
    pub overflow_policy: OverflowPolicy,

    /// Baseline inter-event pacing delay in milliseconds
    pub base_delay_ms: u64,

    /// Adjust pacing from observed downstream latency and errors
    pub adaptive_throttling: bool,

    /// Cap on simultaneously outstanding downstream sends
    #[validate(range(min = 1))]
    pub max_concurrent_drains: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            batch_size: 50,
            drain_interval_ms: 2_000,
            max_retries: 3,
            overflow_policy: OverflowPolicy::DropOldest,
            base_delay_ms: 20,
            adaptive_throttling: true,
            max_concurrent_drains: 3,
        }
    }
}

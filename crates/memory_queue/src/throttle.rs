//! Adaptive pacing controller driven by downstream latency and errors.
//!
//! Fast backoff, slow recovery: a failure bumps the delay immediately and
//! hard, while sustained good latency walks it back a little at a time.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info};

/// Completed-send latencies kept in the rolling window
const LATENCY_WINDOW: usize = 10;
/// Window average above which successful sends still raise the delay
const SLOW_AVG: Duration = Duration::from_millis(1000);
/// Window average below which the delay is allowed to recover
const FAST_AVG: Duration = Duration::from_millis(200);
/// Delay increment applied after a slow success
const SLOW_STEP: Duration = Duration::from_millis(5);
/// Clamp for the success-path delay adjustment
const SLOW_CAP: Duration = Duration::from_millis(100);
/// Delay decrement applied after a fast success
const RECOVERY_STEP: Duration = Duration::from_millis(2);
/// Delay increment applied after any failure
const FAILURE_STEP: Duration = Duration::from_millis(20);
/// Cap for the failure-path delay adjustment
const FAILURE_CAP: Duration = Duration::from_millis(200);

/// Computes the inter-event pacing delay consulted by the drain loop
#[derive(Debug)]
pub struct ThrottleController {
    base_delay: Duration,
    current_delay: Duration,
    recent_latencies: VecDeque<Duration>,
    adaptive: bool,
}

impl ThrottleController {
    /// Create a controller starting at the baseline delay
    pub fn new(base_delay: Duration, adaptive: bool) -> Self {
        Self {
            base_delay,
            current_delay: base_delay,
            recent_latencies: VecDeque::with_capacity(LATENCY_WINDOW),
            adaptive,
        }
    }

    /// Record a completed send and maybe tighten or relax the pacing delay
    ///
    /// The latency always enters the rolling window; the delay only moves
    /// when adaptive throttling is enabled.
    pub fn record_success(&mut self, latency: Duration) {
        self.recent_latencies.push_back(latency);
        if self.recent_latencies.len() > LATENCY_WINDOW {
            self.recent_latencies.pop_front();
        }

        if !self.adaptive {
            return;
        }

        let avg = self.average_latency();
        if avg > SLOW_AVG {
            // Clamps to SLOW_CAP even when failure bumps already pushed the
            // delay higher.
            self.current_delay = (self.current_delay + SLOW_STEP).min(SLOW_CAP);
            debug!(
                delay_ms = self.current_delay.as_millis() as u64,
                avg_ms = avg.as_millis() as u64,
                "increased throttle delay, slow downstream responses"
            );
        } else if avg < FAST_AVG && self.current_delay > self.base_delay {
            self.current_delay = self
                .current_delay
                .saturating_sub(RECOVERY_STEP)
                .max(self.base_delay);
            debug!(
                delay_ms = self.current_delay.as_millis() as u64,
                avg_ms = avg.as_millis() as u64,
                "decreased throttle delay, downstream healthy"
            );
        }
    }

    /// Tighten pacing sharply after a failed send
    ///
    /// Failures do not enter the latency window.
    pub fn record_failure(&mut self) {
        if !self.adaptive {
            return;
        }

        self.current_delay = (self.current_delay + FAILURE_STEP).min(FAILURE_CAP);
        info!(
            delay_ms = self.current_delay.as_millis() as u64,
            "increased throttle delay after send failure"
        );
    }

    /// Current inter-event pacing delay
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// Configured baseline delay
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Whether adaptive throttling is enabled
    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// Rolling average of recorded latencies (zero when none recorded)
    pub fn average_latency(&self) -> Duration {
        if self.recent_latencies.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.recent_latencies.iter().sum();
        total / self.recent_latencies.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(20);

    #[test]
    fn test_slow_successes_raise_delay_toward_cap() {
        let mut throttle = ThrottleController::new(BASE, true);

        let mut last = throttle.current_delay();
        for _ in 0..20 {
            throttle.record_success(Duration::from_millis(1500));
            assert!(throttle.current_delay() >= last);
            last = throttle.current_delay();
        }

        assert_eq!(throttle.current_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_failure_adds_twenty_ms_capped() {
        let mut throttle = ThrottleController::new(BASE, true);

        throttle.record_failure();
        assert_eq!(throttle.current_delay(), Duration::from_millis(40));

        for _ in 0..20 {
            throttle.record_failure();
        }
        assert_eq!(throttle.current_delay(), Duration::from_millis(200));
    }

    #[test]
    fn test_fast_successes_recover_to_base() {
        let mut throttle = ThrottleController::new(BASE, true);

        throttle.record_failure();
        assert!(throttle.current_delay() > BASE);

        for _ in 0..50 {
            throttle.record_success(Duration::from_millis(50));
        }
        assert_eq!(throttle.current_delay(), BASE);
    }

    #[test]
    fn test_delay_never_drops_below_base() {
        let mut throttle = ThrottleController::new(BASE, true);

        for _ in 0..10 {
            throttle.record_success(Duration::from_millis(10));
        }
        assert_eq!(throttle.current_delay(), BASE);
    }

    #[test]
    fn test_success_clamp_applies_above_cap() {
        let mut throttle = ThrottleController::new(BASE, true);

        // Push the delay above 100ms through failures, then observe a slow
        // success pull it back down to the success-path clamp.
        for _ in 0..8 {
            throttle.record_failure();
        }
        assert!(throttle.current_delay() > Duration::from_millis(100));

        throttle.record_success(Duration::from_millis(2000));
        assert_eq!(throttle.current_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_disabled_throttling_keeps_delay_fixed() {
        let mut throttle = ThrottleController::new(BASE, false);

        throttle.record_failure();
        throttle.record_success(Duration::from_millis(5000));
        assert_eq!(throttle.current_delay(), BASE);

        // Latency is still tracked for the stats surface
        assert_eq!(throttle.average_latency(), Duration::from_millis(5000));
    }

    #[test]
    fn test_latency_window_evicts_oldest() {
        let mut throttle = ThrottleController::new(BASE, false);

        throttle.record_success(Duration::from_millis(1100));
        for _ in 0..10 {
            throttle.record_success(Duration::from_millis(100));
        }

        // The 1100ms outlier aged out of the 10-entry window
        assert_eq!(throttle.average_latency(), Duration::from_millis(100));
    }

    #[test]
    fn test_average_is_zero_when_empty() {
        let throttle = ThrottleController::new(BASE, true);
        assert_eq!(throttle.average_latency(), Duration::ZERO);
    }
}

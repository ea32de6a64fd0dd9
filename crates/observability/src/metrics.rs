//! Delivery metrics collection
//!
//! Prometheus recording helpers for the queue health surface, plus in-memory
//! aggregation used for end-of-run summaries.

use contracts::QueueStats;
use metrics::{counter, gauge, histogram};

/// Record queue health gauges from a stats snapshot
///
/// Call this periodically (for example once per second) so the Prometheus
/// surface tracks the live queue.
pub fn record_queue_stats(stats: &QueueStats) {
    gauge!("telemetry_sink_queue_depth").set(stats.queue_size as f64);
    gauge!("telemetry_sink_queue_capacity").set(stats.max_size as f64);
    gauge!("telemetry_sink_in_flight_drains").set(stats.active_concurrent_drains as f64);
    gauge!("telemetry_sink_in_flight_cap").set(stats.max_concurrent_drains as f64);
    gauge!("telemetry_sink_throttle_delay_ms").set(stats.current_throttle_delay_ms as f64);
    gauge!("telemetry_sink_oldest_event_age_ms").set(stats.oldest_event_age_ms as f64);
    gauge!("telemetry_sink_avg_response_ms").set(stats.average_response_time_ms as f64);
}

/// Record an event accepted for delivery
pub fn record_event_accepted() {
    counter!("telemetry_sink_events_accepted_total").increment(1);
}

/// Record an event refused at dispatch
pub fn record_event_rejected(reason: &str) {
    counter!(
        "telemetry_sink_events_rejected_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record an event that failed validation
pub fn record_event_invalid() {
    counter!("telemetry_sink_events_invalid_total").increment(1);
}

/// Record direct-path send latency
pub fn record_send_latency_ms(latency_ms: f64) {
    histogram!("telemetry_sink_direct_send_latency_ms").record(latency_ms);
}

/// Delivery statistics aggregator
///
/// Aggregates queue snapshots in memory for summary output at shutdown.
#[derive(Debug, Clone, Default)]
pub struct DeliveryStatsAggregator {
    /// Snapshots observed
    pub samples: u64,

    /// Queue depth statistics
    pub depth_stats: RunningStats,

    /// Throttle delay statistics (ms)
    pub delay_stats: RunningStats,

    /// Rolling-average downstream latency statistics (ms)
    pub response_stats: RunningStats,

    /// Highest in-flight count observed
    pub peak_in_flight: usize,
}

impl DeliveryStatsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one queue snapshot into the aggregate
    pub fn update(&mut self, stats: &QueueStats) {
        self.samples += 1;
        self.depth_stats.push(stats.queue_size as f64);
        self.delay_stats.push(stats.current_throttle_delay_ms as f64);
        if stats.average_response_time_ms > 0 {
            self.response_stats.push(stats.average_response_time_ms as f64);
        }
        self.peak_in_flight = self.peak_in_flight.max(stats.active_concurrent_drains);
    }

    /// Produce a summary report
    pub fn summary(&self) -> DeliverySummary {
        DeliverySummary {
            samples: self.samples,
            peak_in_flight: self.peak_in_flight,
            queue_depth: StatsSummary::from(&self.depth_stats),
            throttle_delay_ms: StatsSummary::from(&self.delay_stats),
            response_time_ms: StatsSummary::from(&self.response_stats),
        }
    }

    /// Reset the aggregate
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated delivery summary
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    pub samples: u64,
    pub peak_in_flight: usize,
    pub queue_depth: StatsSummary,
    pub throttle_delay_ms: StatsSummary,
    pub response_time_ms: StatsSummary,
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Delivery Summary ===")?;
        writeln!(f, "Queue snapshots: {}", self.samples)?;
        writeln!(f, "Peak in-flight sends: {}", self.peak_in_flight)?;
        writeln!(f, "Queue depth: {}", self.queue_depth)?;
        writeln!(f, "Throttle delay (ms): {}", self.throttle_delay_ms)?;
        writeln!(f, "Downstream latency (ms): {}", self.response_time_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum value
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum value
    pub fn max(&self) -> f64 {
        self.max
    }
}

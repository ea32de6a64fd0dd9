//! Ingest run statistics.

use std::time::Duration;

use observability::DeliveryStatsAggregator;

/// Statistics from an ingest run
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Total events read from the source
    pub events_seen: u64,

    /// Events accepted for delivery (queued or delivered directly)
    pub events_accepted: u64,

    /// Events refused at dispatch (capacity, configuration, timeout)
    pub events_rejected: u64,

    /// Events that failed validation
    pub events_invalid: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Queue snapshot aggregation
    pub aggregator: DeliveryStatsAggregator,
}

impl IngestStats {
    /// Calculate events per second throughput
    pub fn events_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_seen as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print a human-readable summary
    pub fn print_summary(&self) {
        println!("\n=== Ingest Summary ===\n");
        println!("Events seen:     {}", self.events_seen);
        println!("Accepted:        {}", self.events_accepted);
        println!("Rejected:        {}", self.events_rejected);
        println!("Invalid:         {}", self.events_invalid);
        println!("Duration:        {:.2}s", self.duration.as_secs_f64());
        println!("Throughput:      {:.1} events/s", self.events_per_second());
        println!();
        println!("{}", self.aggregator.summary());
    }
}

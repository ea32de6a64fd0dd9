//! Ingest service - wires the event source, validation, dispatch, and stats.

mod source;
mod stats;

pub use stats::IngestStats;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{EventValidator, PlayerEventValidator, SinkBlueprint};
use dispatcher::{AdapterRegistry, Dispatcher, SendAck};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::CliError;

/// Bound on the shutdown flush
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);
/// Period between queue stat snapshots
const STATS_PERIOD: Duration = Duration::from_secs(1);

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// The loaded blueprint
    pub blueprint: SinkBlueprint,

    /// Maximum number of events to ingest (None = unlimited)
    pub max_events: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main ingest service
pub struct IngestService {
    config: ServiceConfig,
}

impl IngestService {
    /// Create a new service with the given configuration
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Run the service until the source closes, a limit is hit, or `shutdown`
    /// resolves; then flush and tear down.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<IngestStats, CliError> {
        let start_time = Instant::now();

        // Initialize metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)
                .map_err(|e| CliError::observability(e.to_string()))?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup dispatch
        let registry = Arc::new(AdapterRegistry::with_default_factory());
        let mut dispatcher = Dispatcher::from_blueprint(&self.config.blueprint, registry);
        let validator = PlayerEventValidator;

        info!(
            transport = ?self.config.blueprint.dispatch.transport,
            buffering = !self.config.blueprint.dispatch.disable_buffering,
            "Dispatcher ready"
        );

        // Setup event source
        let (event_rx, reader_task) = source::spawn_reader(&self.config.blueprint.ingest).await?;

        let mut stats = IngestStats::default();
        let mut stat_ticker = tokio::time::interval(STATS_PERIOD);
        stat_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let run_deadline = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(run_deadline);

        info!(max_events = ?self.config.max_events, "Ingest service running");

        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Ok(payload) => {
                            stats.events_seen += 1;

                            if !validator.is_valid(&payload) {
                                stats.events_invalid += 1;
                                observability::record_event_invalid();
                                debug!("invalid player event skipped");
                            } else {
                                Self::dispatch_event(&dispatcher, payload, &mut stats).await;
                            }

                            if stats.events_seen % 100 == 0 {
                                debug!(events = stats.events_seen, "Ingest progress");
                            }

                            if let Some(max) = self.config.max_events {
                                if stats.events_seen >= max {
                                    info!(events = stats.events_seen, "Reached max events limit");
                                    break;
                                }
                            }
                        }
                        Err(_) => {
                            info!("Event source closed");
                            break;
                        }
                    }
                }
                _ = stat_ticker.tick() => {
                    if let Some(queue_stats) = dispatcher.stats() {
                        observability::record_queue_stats(&queue_stats);
                        stats.aggregator.update(&queue_stats);
                    }
                }
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping ingest...");
                    break;
                }
                _ = &mut run_deadline => {
                    warn!("Run timeout reached, stopping ingest...");
                    break;
                }
            }
        }

        // Shutdown: stop the source, flush remaining events, tear down
        reader_task.abort();

        info!("Flushing memory queue before shutdown...");
        if tokio::time::timeout(FLUSH_TIMEOUT, dispatcher.flush())
            .await
            .is_err()
        {
            warn!(
                timeout_secs = FLUSH_TIMEOUT.as_secs(),
                "Flush did not complete before deadline"
            );
        }

        if let Some(queue_stats) = dispatcher.stats() {
            stats.aggregator.update(&queue_stats);
        }
        dispatcher.destroy();

        stats.duration = start_time.elapsed();
        info!(
            events = stats.events_seen,
            accepted = stats.events_accepted,
            duration_secs = stats.duration.as_secs_f64(),
            "Ingest service stopped"
        );

        Ok(stats)
    }

    async fn dispatch_event(
        dispatcher: &Dispatcher,
        payload: serde_json::Value,
        stats: &mut IngestStats,
    ) {
        match dispatcher.send(payload).await {
            Ok(SendAck::Queued { .. }) => {
                stats.events_accepted += 1;
                observability::record_event_accepted();
            }
            Ok(SendAck::Delivered { elapsed, .. }) => {
                stats.events_accepted += 1;
                observability::record_event_accepted();
                observability::record_send_latency_ms(elapsed.as_secs_f64() * 1000.0);
            }
            Ok(SendAck::Rejected { reason }) => {
                stats.events_rejected += 1;
                observability::record_event_rejected("rejected");
                warn!(reason = %reason, "Event rejected by dispatcher");
            }
            Ok(SendAck::TimedOut { waited }) => {
                stats.events_rejected += 1;
                observability::record_event_rejected("timeout");
                warn!(waited_ms = waited.as_millis() as u64, "Event timed out");
            }
            Err(e) => {
                stats.events_rejected += 1;
                observability::record_event_rejected("capacity");
                warn!(error = %e, "Enqueue refused");
            }
        }
    }
}

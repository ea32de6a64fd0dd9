//! Complete pipeline demo: synthetic player events -> validator -> dispatcher
//! -> log transport.
//!
//! Run with: cargo run --bin ingest_pipeline

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    DispatchOptions, EventValidator, PlayerEventValidator, QueueOptions, TransportKind,
};
use dispatcher::{AdapterRegistry, Dispatcher, SendAck};
use rand::Rng;
use serde_json::json;
use tracing::info;

const EVENT_NAMES: &[&str] = &[
    "init",
    "loading",
    "loaded",
    "playing",
    "heartbeat",
    "buffering",
    "buffered",
    "paused",
    "seeking",
    "seeked",
    "stopped",
];

const SESSIONS: &[&str] = &[
    "c4ca4238-a0b9-3382-8dcc-509a6f75849b",
    "c81e7288-d9e1-465e-a249-9b16e71e0e01",
    "eccbc87e-4b5c-32fe-a830-8fd9f2a7baf3",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_with_config(observability::ObservabilityConfig {
        log_format: observability::LogFormat::Pretty,
        metrics_port: None,
        default_log_level: "info".to_string(),
    })?;

    let registry = Arc::new(AdapterRegistry::with_default_factory());
    let options = DispatchOptions {
        transport: Some(TransportKind::Log),
        ..Default::default()
    };
    let queue_options = QueueOptions {
        drain_interval_ms: 200,
        base_delay_ms: 5,
        ..Default::default()
    };
    let mut sink = Dispatcher::new(options, queue_options, registry);
    let validator = PlayerEventValidator;

    info!("Generating synthetic player telemetry...");

    let mut rng = rand::rng();
    let mut accepted = 0u64;

    for i in 0..200u64 {
        let session = SESSIONS[rng.random_range(0..SESSIONS.len())];
        let name = EVENT_NAMES[rng.random_range(0..EVENT_NAMES.len())];
        let event = json!({
            "event": name,
            "sessionId": session,
            "timestamp": 1_700_000_000.0 + i as f64,
            "playhead": rng.random_range(0.0..3600.0),
            "duration": 3600.0,
        });

        if !validator.is_valid(&event) {
            continue;
        }

        match sink.send(event).await? {
            SendAck::Queued { depth, .. } => {
                accepted += 1;
                if depth % 50 == 0 {
                    info!(depth, "queue filling");
                }
            }
            ack => info!(?ack, "unexpected ack"),
        }

        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    info!(accepted, "All events submitted, flushing...");
    sink.flush().await;

    if let Some(stats) = sink.stats() {
        info!(
            queue_size = stats.queue_size,
            avg_response_ms = stats.average_response_time_ms,
            throttle_delay_ms = stats.current_throttle_delay_ms,
            "Final queue stats"
        );
    }

    sink.destroy();
    info!("Demo finished");
    Ok(())
}

//! # Integration Tests
//!
//! Cross-crate tests for the telemetry sink: the memory queue engine, the
//! dispatcher, and the transport registry working together.

#[cfg(test)]
mod support {
    use async_trait::async_trait;
    use contracts::{PushReceipt, QueueTransport, SinkError, TransportFactory, TransportKind};
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Transport that records every pushed payload in order
    pub struct RecordingTransport {
        pub pushed: Mutex<Vec<Value>>,
    }

    impl RecordingTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                pushed: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl QueueTransport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }

        async fn push(&self, event: Value) -> Result<PushReceipt, SinkError> {
            self.pushed.lock().unwrap().push(event);
            Ok(PushReceipt {
                transport: "recording".to_string(),
                accepted_at: String::new(),
                detail: None,
            })
        }
    }

    /// Transport that always fails, counting attempts
    pub struct FailingTransport {
        pub attempts: AtomicU32,
    }

    impl FailingTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                attempts: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl QueueTransport for FailingTransport {
        fn name(&self) -> &str {
            "failing"
        }

        async fn push(&self, _event: Value) -> Result<PushReceipt, SinkError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SinkError::send_failed("failing", "downstream unavailable"))
        }
    }

    /// Transport that holds each push and tracks peak concurrency
    pub struct SlowTransport {
        pub current: AtomicUsize,
        pub peak: AtomicUsize,
        pub hold: Duration,
    }

    impl SlowTransport {
        pub fn new(hold: Duration) -> Arc<Self> {
            Arc::new(Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                hold,
            })
        }
    }

    #[async_trait]
    impl QueueTransport for SlowTransport {
        fn name(&self) -> &str {
            "slow"
        }

        async fn push(&self, _event: Value) -> Result<PushReceipt, SinkError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.hold).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(PushReceipt::default())
        }
    }

    /// Factory that hands out a fixed transport, counting constructions
    pub struct FixedFactory {
        transport: Arc<dyn QueueTransport>,
        pub built: AtomicU32,
        pub build_hold: Duration,
    }

    impl FixedFactory {
        pub fn new(transport: Arc<dyn QueueTransport>) -> Arc<Self> {
            Arc::new(Self {
                transport,
                built: AtomicU32::new(0),
                build_hold: Duration::from_millis(20),
            })
        }
    }

    #[async_trait]
    impl TransportFactory for FixedFactory {
        async fn build(
            &self,
            _kind: TransportKind,
            _params: &HashMap<String, String>,
        ) -> Result<Arc<dyn QueueTransport>, SinkError> {
            tokio::time::sleep(self.build_hold).await;
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&self.transport))
        }
    }

    /// A valid player event with a sequence marker
    pub fn player_event(seq: i64) -> Value {
        serde_json::json!({
            "event": "playing",
            "sessionId": "5d5dbd6d",
            "timestamp": 1_699_999_000.0 + seq as f64,
            "playhead": seq as f64,
            "seq": seq,
        })
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{DispatchOptions, OverflowPolicy, QueueOptions, TransportKind};
    use dispatcher::{AdapterRegistry, Dispatcher, SendAck};

    use crate::support::{
        player_event, FailingTransport, FixedFactory, RecordingTransport, SlowTransport,
    };

    fn fast_queue() -> QueueOptions {
        QueueOptions {
            max_size: 100,
            batch_size: 10,
            drain_interval_ms: 20,
            max_retries: 3,
            overflow_policy: OverflowPolicy::DropOldest,
            base_delay_ms: 0,
            adaptive_throttling: false,
            max_concurrent_drains: 1,
        }
    }

    fn buffered_options() -> DispatchOptions {
        DispatchOptions {
            transport: Some(TransportKind::Log),
            ..Default::default()
        }
    }

    /// End-to-end: enqueue K events, flush, observe exactly K deliveries in
    /// enqueue order.
    #[tokio::test]
    async fn test_e2e_buffered_delivery_order() {
        let transport = RecordingTransport::new();
        let registry = Arc::new(AdapterRegistry::new(FixedFactory::new(
            transport.clone() as _
        ) as _));
        let mut dispatcher = Dispatcher::new(buffered_options(), fast_queue(), registry);

        for seq in 0..7 {
            let ack = dispatcher.send(player_event(seq)).await.unwrap();
            assert!(matches!(ack, SendAck::Queued { .. }));
        }

        dispatcher.flush().await;

        let pushed = transport.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 7);
        let order: Vec<i64> = pushed.iter().map(|v| v["seq"].as_i64().unwrap()).collect();
        assert_eq!(order, (0..7).collect::<Vec<_>>());
        drop(pushed);

        assert_eq!(dispatcher.stats().unwrap().queue_size, 0);
        dispatcher.destroy();
    }

    /// Buffered acceptance does not depend on a reachable backend: events are
    /// accepted, retried, and eventually given up without surfacing to the
    /// producer.
    #[tokio::test]
    async fn test_e2e_unreachable_backend_still_accepts() {
        let transport = FailingTransport::new();
        let registry = Arc::new(AdapterRegistry::new(FixedFactory::new(
            transport.clone() as _
        ) as _));
        let options = QueueOptions {
            max_retries: 1,
            ..fast_queue()
        };
        let mut dispatcher = Dispatcher::new(buffered_options(), options, registry);

        let ack = dispatcher.send(player_event(0)).await.unwrap();
        assert!(matches!(ack, SendAck::Queued { .. }));

        // 1 original attempt + 1 retry, then the event is given up
        dispatcher.flush().await;
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.stats().unwrap().queue_size, 0);

        dispatcher.destroy();
    }

    /// The in-flight cap bounds concurrency across a burst even when the
    /// downstream holds every call.
    #[tokio::test]
    async fn test_e2e_concurrency_cap_holds_under_burst() {
        let transport = SlowTransport::new(Duration::from_millis(40));
        let registry = Arc::new(AdapterRegistry::new(FixedFactory::new(
            transport.clone() as _
        ) as _));
        let options = QueueOptions {
            max_concurrent_drains: 2,
            batch_size: 5,
            ..fast_queue()
        };
        let mut dispatcher = Dispatcher::new(buffered_options(), options, registry);

        for seq in 0..5 {
            dispatcher.send(player_event(seq)).await.unwrap();
        }
        dispatcher.flush().await;

        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(transport.current.load(Ordering::SeqCst), 0);
        dispatcher.destroy();
    }

    /// Two concurrent direct sends for the same unresolved transport share one
    /// construction.
    #[tokio::test]
    async fn test_e2e_direct_sends_share_single_flight_construction() {
        let transport = RecordingTransport::new();
        let factory = FixedFactory::new(transport.clone() as _);
        let registry = Arc::new(AdapterRegistry::new(factory.clone() as _));
        let options = DispatchOptions {
            transport: Some(TransportKind::Log),
            disable_buffering: true,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(options, fast_queue(), registry);

        let (a, b) = tokio::join!(
            dispatcher.send(player_event(0)),
            dispatcher.send(player_event(1))
        );

        assert!(matches!(a.unwrap(), SendAck::Delivered { .. }));
        assert!(matches!(b.unwrap(), SendAck::Delivered { .. }));
        assert_eq!(factory.built.load(Ordering::SeqCst), 1);
        assert_eq!(transport.pushed.lock().unwrap().len(), 2);
    }

    /// Direct mode without a configured transport rejects with a structured
    /// reason instead of failing the caller.
    #[tokio::test]
    async fn test_e2e_direct_mode_unconfigured_rejects() {
        let registry = Arc::new(AdapterRegistry::with_default_factory());
        let options = DispatchOptions {
            disable_buffering: true,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(options, fast_queue(), registry);

        let ack = dispatcher.send(player_event(0)).await.unwrap();
        match ack {
            SendAck::Rejected { reason } => assert!(reason.contains("no queue transport")),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    /// Direct-mode deadline produces a timeout ack while the slow call keeps
    /// running in the background.
    #[tokio::test]
    async fn test_e2e_direct_mode_timeout() {
        let transport = SlowTransport::new(Duration::from_millis(500));
        let registry = Arc::new(AdapterRegistry::new(FixedFactory::new(
            transport.clone() as _
        ) as _));
        let options = DispatchOptions {
            transport: Some(TransportKind::Log),
            disable_buffering: true,
            direct_send_timeout_ms: 50,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(options, fast_queue(), registry);

        let ack = dispatcher.send(player_event(0)).await.unwrap();
        assert!(matches!(ack, SendAck::TimedOut { .. }));

        // The downstream call was not cancelled; it completes on its own
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(transport.current.load(Ordering::SeqCst), 0);
        assert_eq!(transport.peak.load(Ordering::SeqCst), 1);
    }

    /// Overflow under drop-oldest keeps the newest events; the full pipeline
    /// then drains the survivors.
    #[tokio::test]
    async fn test_e2e_overflow_drops_oldest_then_drains() {
        let transport = RecordingTransport::new();
        let registry = Arc::new(AdapterRegistry::new(FixedFactory::new(
            transport.clone() as _
        ) as _));
        let options = QueueOptions {
            max_size: 3,
            drain_interval_ms: 60_000,
            ..fast_queue()
        };
        let mut dispatcher = Dispatcher::new(buffered_options(), options, registry);

        for seq in 0..5 {
            dispatcher.send(player_event(seq)).await.unwrap();
        }
        assert_eq!(dispatcher.stats().unwrap().queue_size, 3);

        dispatcher.flush().await;

        let pushed = transport.pushed.lock().unwrap();
        let order: Vec<i64> = pushed.iter().map(|v| v["seq"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![2, 3, 4]);
        drop(pushed);

        dispatcher.destroy();
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::TransportKind;

    /// Loaded blueprints drive the dispatcher wiring end to end.
    #[test]
    fn test_blueprint_covers_dispatch_wiring() {
        let content = r#"
[queue]
max_size = 500
overflow_policy = "reject"

[dispatch]
transport = "file"
[dispatch.transport_params]
path = "/tmp/events.ndjson"
"#;
        let blueprint = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.queue.max_size, 500);
        assert_eq!(blueprint.dispatch.transport, Some(TransportKind::File));
        assert_eq!(
            blueprint.dispatch.transport_params.get("path").unwrap(),
            "/tmp/events.ndjson"
        );
    }
}

//! Timer-driven drain scheduler over the bounded event buffer.
//!
//! One recurring tick pulls a batch, paces event starts with the throttle
//! delay, and hands each event to the single drain consumer under a hard
//! concurrency cap. A failed send re-enters at the buffer head until its
//! retries run out.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use contracts::{
    DrainConsumer, EnqueueAck, QueueOptions, QueueSignal, QueueStats, QueuedEvent, SinkError,
};
use metrics::{counter, histogram};
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::buffer::EventBuffer;
use crate::throttle::ThrottleController;

/// Poll period used by `flush`
const FLUSH_POLL: Duration = Duration::from_millis(10);

struct QueueState {
    buffer: EventBuffer,
    throttle: ThrottleController,
}

struct QueueInner<C> {
    options: QueueOptions,
    state: Mutex<QueueState>,
    /// Enforces the hard cap on concurrent downstream calls
    in_flight: Arc<Semaphore>,
    /// Sends launched but not yet completed (includes permit waiters)
    pending: AtomicUsize,
    processing: AtomicBool,
    consumer: C,
    signal_tx: mpsc::UnboundedSender<QueueSignal>,
}

/// Bounded in-memory event queue with background draining
///
/// Producers enqueue without suspending; a recurring drain task delivers
/// buffered events to the injected consumer. Dropping the queue aborts the
/// drain task, so no background work outlives it.
pub struct MemoryQueue<C: DrainConsumer + Send + Sync + 'static> {
    inner: Arc<QueueInner<C>>,
    drain_task: JoinHandle<()>,
}

impl<C: DrainConsumer + Send + Sync + 'static> MemoryQueue<C> {
    /// Create the queue and start its drain timer
    ///
    /// The returned receiver carries drop/failure signals to the queue's one
    /// registered consumer.
    pub fn spawn(
        options: QueueOptions,
        consumer: C,
    ) -> (Self, mpsc::UnboundedReceiver<QueueSignal>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let base_delay = Duration::from_millis(options.base_delay_ms);
        let inner = Arc::new(QueueInner {
            state: Mutex::new(QueueState {
                buffer: EventBuffer::new(options.max_size, options.overflow_policy),
                throttle: ThrottleController::new(base_delay, options.adaptive_throttling),
            }),
            in_flight: Arc::new(Semaphore::new(options.max_concurrent_drains)),
            pending: AtomicUsize::new(0),
            processing: AtomicBool::new(false),
            consumer,
            signal_tx,
            options,
        });

        let drain_inner = Arc::clone(&inner);
        let interval = Duration::from_millis(inner.options.drain_interval_ms);
        let drain_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                Arc::clone(&drain_inner).process_batch().await;
            }
        });

        info!(
            max_size = inner.options.max_size,
            batch_size = inner.options.batch_size,
            drain_interval_ms = inner.options.drain_interval_ms,
            max_concurrent_drains = inner.options.max_concurrent_drains,
            "memory queue started"
        );

        (Self { inner, drain_task }, signal_rx)
    }

    /// Accept a payload for asynchronous delivery; never suspends
    ///
    /// # Errors
    /// `CapacityExceeded` when the buffer is full under the reject or
    /// drop-newest policy.
    pub fn enqueue(&self, payload: Value) -> Result<EnqueueAck, SinkError> {
        self.inner.enqueue(payload)
    }

    /// Number of buffered events
    pub fn size(&self) -> usize {
        self.inner.state().buffer.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inner.state().buffer.is_empty()
    }

    /// Read-only health snapshot
    pub fn stats(&self) -> QueueStats {
        self.inner.stats()
    }

    /// Drain until the buffer is empty and no sends remain in flight
    ///
    /// Does not stop new enqueues; callers bound the wait with their own
    /// timeout.
    pub async fn flush(&self) {
        info!(size = self.size(), "flushing memory queue");

        loop {
            Arc::clone(&self.inner).process_batch().await;
            if self.is_idle() {
                break;
            }
            tokio::time::sleep(FLUSH_POLL).await;
        }
    }

    fn is_idle(&self) -> bool {
        !self.inner.processing.load(Ordering::Acquire)
            && self.inner.in_flight_count() == 0
            && self.is_empty()
    }

    /// Stop the drain timer and discard buffered events
    ///
    /// Destructive: call `flush` first when remaining events matter.
    pub fn destroy(self) {
        self.drain_task.abort();
        let mut state = self.inner.state();
        let discarded = state.buffer.len();
        state.buffer.clear();
        info!(discarded, "memory queue destroyed");
    }
}

impl<C: DrainConsumer + Send + Sync + 'static> Drop for MemoryQueue<C> {
    fn drop(&mut self) {
        self.drain_task.abort();
    }
}

impl<C: DrainConsumer + Send + Sync + 'static> QueueInner<C> {
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    fn enqueue(&self, payload: Value) -> Result<EnqueueAck, SinkError> {
        let (ack, evicted) = self.state().buffer.push(payload)?;

        if let Some(dropped) = evicted {
            warn!(id = %dropped.id, "memory queue overflow: dropped oldest event");
            counter!("sink_queue_events_dropped_total", "reason" => "overflow").increment(1);
            let _ = self.signal_tx.send(QueueSignal::Dropped(dropped));
        }

        counter!("sink_queue_events_enqueued_total").increment(1);
        debug!(id = %ack.id, depth = ack.depth, "event queued in memory");
        Ok(ack)
    }

    /// Launch one drain batch; returns without waiting for deliveries
    async fn process_batch(self: Arc<Self>) {
        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let batch = {
            let mut state = self.state();
            if state.buffer.is_empty() {
                self.processing.store(false, Ordering::Release);
                return;
            }
            if self.in_flight_count() >= self.options.max_concurrent_drains {
                debug!(
                    in_flight = self.in_flight_count(),
                    "skipping drain tick: concurrency cap reached"
                );
                self.processing.store(false, Ordering::Release);
                return;
            }
            state.buffer.take_batch(self.options.batch_size)
        };

        debug!(
            batch = batch.len(),
            remaining = self.state().buffer.len(),
            delay_ms = self.state().throttle.current_delay().as_millis() as u64,
            "processing drain batch"
        );

        for (i, event) in batch.into_iter().enumerate() {
            if i > 0 {
                // Delay may move mid-batch as completions come back
                let delay = self.state().throttle.current_delay();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Arc::clone(&self).spawn_drain(event);
        }

        self.processing.store(false, Ordering::Release);
    }

    fn spawn_drain(self: Arc<Self>, event: QueuedEvent) {
        let inner = self;
        // Counted from launch so flush waits out permit waiters too
        inner.pending.fetch_add(1, Ordering::AcqRel);
        tokio::spawn(async move {
            let permit = match Arc::clone(&inner.in_flight).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    inner.pending.fetch_sub(1, Ordering::AcqRel);
                    return;
                }
            };

            let started = Instant::now();
            match inner.consumer.drain(&event).await {
                Ok(_receipt) => inner.complete_success(&event, started.elapsed()),
                Err(e) => inner.complete_failure(event, &e),
            }

            drop(permit);
            inner.pending.fetch_sub(1, Ordering::AcqRel);
        });
    }

    fn complete_success(&self, event: &QueuedEvent, elapsed: Duration) {
        histogram!("sink_queue_send_latency_ms").record(elapsed.as_secs_f64() * 1000.0);
        counter!("sink_queue_events_delivered_total").increment(1);

        self.state().throttle.record_success(elapsed);
        debug!(
            id = %event.id,
            elapsed_ms = elapsed.as_millis() as u64,
            "drained event from memory queue"
        );
    }

    fn complete_failure(&self, mut event: QueuedEvent, cause: &SinkError) {
        counter!("sink_queue_send_failures_total").increment(1);
        error!(id = %event.id, error = %cause, "failed to drain event");

        event.retry_count += 1;

        let given_up = {
            let mut state = self.state();
            state.throttle.record_failure();
            if event.retry_count <= self.options.max_retries {
                warn!(
                    id = %event.id,
                    retry = event.retry_count,
                    max_retries = self.options.max_retries,
                    "event re-queued for retry"
                );
                state.buffer.reinsert_front(event);
                None
            } else {
                Some(event)
            }
        };

        if let Some(event) = given_up {
            let retries = event.retry_count;
            let outcome = SinkError::RetriesExhausted {
                id: event.id.clone(),
                attempts: retries,
            };
            error!(error = %outcome, "event failed permanently, giving up");
            counter!("sink_queue_events_dropped_total", "reason" => "retries_exhausted")
                .increment(1);
            let _ = self.signal_tx.send(QueueSignal::Failed { event, retries });
        }
    }

    fn stats(&self) -> QueueStats {
        let state = self.state();
        QueueStats {
            queue_size: state.buffer.len(),
            max_size: self.options.max_size,
            is_processing: self.processing.load(Ordering::Acquire),
            oldest_event_age_ms: state
                .buffer
                .oldest_age()
                .map(|age| age.as_millis() as u64)
                .unwrap_or(0),
            active_concurrent_drains: self.in_flight_count(),
            max_concurrent_drains: self.options.max_concurrent_drains,
            current_throttle_delay_ms: state.throttle.current_delay().as_millis() as u64,
            base_throttle_delay_ms: state.throttle.base_delay().as_millis() as u64,
            average_response_time_ms: state.throttle.average_latency().as_millis() as u64,
            adaptive_throttling: state.throttle.is_adaptive(),
        }
    }
}

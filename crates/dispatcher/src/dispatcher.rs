//! Dispatcher - public entry point for submitting telemetry events.

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    DispatchOptions, PushReceipt, QueueOptions, QueueSignal, QueueStats, SinkBlueprint, SinkError,
};
use memory_queue::MemoryQueue;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::downstream::DownstreamSender;
use crate::registry::AdapterRegistry;

/// Outcome of a dispatched event
#[derive(Debug)]
pub enum SendAck {
    /// Accepted into the memory queue for asynchronous delivery
    Queued {
        /// Queue-assigned event id
        id: String,
        /// Buffer depth right after the enqueue
        depth: usize,
    },
    /// Delivered synchronously through the direct path
    Delivered {
        /// Transport acknowledgement
        receipt: PushReceipt,
        /// Wall time spent on the call
        elapsed: Duration,
    },
    /// Direct path refused: missing configuration, construction or send failure
    Rejected {
        /// Human-readable refusal reason
        reason: String,
    },
    /// Direct path gave up waiting; the downstream call keeps running
    TimedOut {
        /// Deadline that expired
        waited: Duration,
    },
}

/// Routes events to the memory queue or straight to a transport
///
/// One dispatcher per process in typical deployment; the adapter registry is
/// injected so multiple dispatchers share the transport cache.
pub struct Dispatcher {
    sender: Arc<DownstreamSender>,
    queue: Option<MemoryQueue<Arc<DownstreamSender>>>,
    signal_task: Option<JoinHandle<()>>,
    options: DispatchOptions,
}

impl Dispatcher {
    /// Create a dispatcher; spawns the memory queue unless buffering is disabled
    pub fn new(
        options: DispatchOptions,
        queue_options: QueueOptions,
        registry: Arc<AdapterRegistry>,
    ) -> Self {
        let sender = Arc::new(DownstreamSender::new(options.clone(), registry));

        let (queue, signal_task) = if options.disable_buffering {
            info!("memory queue disabled, every send uses the direct path");
            (None, None)
        } else {
            let (queue, signals) = MemoryQueue::spawn(queue_options, Arc::clone(&sender));
            let signal_task = tokio::spawn(log_queue_signals(signals));
            info!("memory queue initialized and background drain started");
            (Some(queue), Some(signal_task))
        };

        Self {
            sender,
            queue,
            signal_task,
            options,
        }
    }

    /// Build a dispatcher from a loaded blueprint
    pub fn from_blueprint(blueprint: &SinkBlueprint, registry: Arc<AdapterRegistry>) -> Self {
        Self::new(
            blueprint.dispatch.clone(),
            blueprint.queue.clone(),
            registry,
        )
    }

    /// Submit one validated event
    ///
    /// Buffered mode returns as soon as the event is accepted for delivery;
    /// capacity refusals surface as errors. Direct mode waits for the
    /// downstream call or its deadline.
    #[instrument(name = "dispatcher_send", skip(self, payload))]
    pub async fn send(&self, payload: Value) -> Result<SendAck, SinkError> {
        match &self.queue {
            Some(queue) => {
                let ack = queue.enqueue(payload)?;
                debug!(id = %ack.id, depth = ack.depth, "event added to memory queue");
                Ok(SendAck::Queued {
                    id: ack.id,
                    depth: ack.depth,
                })
            }
            None => Ok(self.send_direct(payload).await),
        }
    }

    /// Deliver one event synchronously under the direct-path deadline
    ///
    /// Deadline expiry stops the wait only: the downstream call is left
    /// running to completion rather than cancelled.
    #[instrument(name = "dispatcher_send_direct", skip(self, payload))]
    pub async fn send_direct(&self, payload: Value) -> SendAck {
        let deadline = Duration::from_millis(self.options.direct_send_timeout_ms);
        let sender = Arc::clone(&self.sender);
        let call = tokio::spawn(async move { sender.deliver(payload).await });

        let started = Instant::now();
        match tokio::time::timeout(deadline, call).await {
            Ok(Ok(Ok(receipt))) => SendAck::Delivered {
                receipt,
                elapsed: started.elapsed(),
            },
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "direct send rejected");
                SendAck::Rejected {
                    reason: e.to_string(),
                }
            }
            Ok(Err(join_error)) => {
                error!(error = %join_error, "direct send task failed");
                SendAck::Rejected {
                    reason: join_error.to_string(),
                }
            }
            Err(_) => {
                let cause = SinkError::DirectSendTimeout {
                    elapsed_ms: deadline.as_millis() as u64,
                };
                warn!(error = %cause, "direct send gave up waiting");
                SendAck::TimedOut { waited: deadline }
            }
        }
    }

    /// Queue health snapshot (None when buffering is disabled)
    pub fn stats(&self) -> Option<QueueStats> {
        self.queue.as_ref().map(MemoryQueue::stats)
    }

    /// Drain all buffered events; no-op when buffering is disabled
    pub async fn flush(&self) {
        if let Some(queue) = &self.queue {
            queue.flush().await;
        }
    }

    /// Tear down the memory queue and its signal logger
    ///
    /// Buffered events still pending are discarded; `flush` first when they
    /// matter.
    pub fn destroy(&mut self) {
        if let Some(task) = self.signal_task.take() {
            task.abort();
        }
        if let Some(queue) = self.queue.take() {
            queue.destroy();
        }
    }
}

/// Logs drop/failure signals - the queue's one registered consumer
async fn log_queue_signals(mut signals: mpsc::UnboundedReceiver<QueueSignal>) {
    while let Some(signal) = signals.recv().await {
        match signal {
            QueueSignal::Dropped(event) => {
                warn!(id = %event.id, "event was dropped from memory queue due to overflow");
            }
            QueueSignal::Failed { event, retries } => {
                error!(id = %event.id, retries, "event permanently failed after all retries");
            }
        }
    }
}

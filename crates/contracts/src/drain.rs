//! DrainConsumer trait - the memory queue's delivery hook
//!
//! Exactly one consumer is bound per queue; the engine never fans signals out
//! to multiple listeners.

use std::sync::Arc;

use crate::{PushReceipt, QueuedEvent, SinkError};

/// Delivery capability invoked by the drain scheduler for each event
#[trait_variant::make(DrainConsumer: Send)]
pub trait LocalDrainConsumer {
    /// Attempt to deliver one buffered event downstream
    ///
    /// # Errors
    /// Any failure feeds the queue's retry-or-give-up path.
    async fn drain(&self, event: &QueuedEvent) -> Result<PushReceipt, SinkError>;
}

/// Shared ownership forwards to the inner consumer, so a queue can be made
/// generic over `Arc<C>` for any consumer `C`.
impl<T> DrainConsumer for Arc<T>
where
    T: DrainConsumer + Send + Sync + ?Sized,
{
    async fn drain(&self, event: &QueuedEvent) -> Result<PushReceipt, SinkError> {
        (**self).drain(event).await
    }
}

/// Signals emitted by the queue to its one registered consumer
#[derive(Debug)]
pub enum QueueSignal {
    /// An event was evicted by the drop-oldest overflow policy
    Dropped(QueuedEvent),
    /// An event exhausted its retries and was discarded
    Failed {
        /// The discarded event
        event: QueuedEvent,
        /// Final retry count (`max_retries + 1` attempts were made in total)
        retries: u32,
    },
}

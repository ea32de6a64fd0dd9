//! Bounded FIFO event buffer with overflow policies.
//!
//! Plain synchronous structure owned behind the queue's state lock. Retried
//! events re-enter at the head, so they are serviced before younger events.

use std::collections::VecDeque;
use std::time::Duration;

use contracts::{EnqueueAck, OverflowPolicy, QueuedEvent, SinkError};
use serde_json::Value;
use tracing::warn;

/// Initial capacity reserved for the backing deque
const INITIAL_CAPACITY: usize = 1024;

/// Bounded FIFO holding events awaiting delivery
#[derive(Debug)]
pub struct EventBuffer {
    entries: VecDeque<QueuedEvent>,
    max_size: usize,
    policy: OverflowPolicy,
    next_id: u64,
    dropped_count: u64,
}

impl EventBuffer {
    /// Create an empty buffer with the given capacity and overflow policy
    pub fn new(max_size: usize, policy: OverflowPolicy) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size.min(INITIAL_CAPACITY)),
            max_size,
            policy,
            next_id: 1,
            dropped_count: 0,
        }
    }

    /// Append a payload, applying the overflow policy when at capacity
    ///
    /// Returns the enqueue ack plus the event evicted under drop-oldest, if
    /// any, so the caller can emit the eviction signal.
    pub fn push(
        &mut self,
        payload: Value,
    ) -> Result<(EnqueueAck, Option<QueuedEvent>), SinkError> {
        let evicted = if self.entries.len() >= self.max_size {
            self.apply_overflow()?
        } else {
            None
        };

        let id = format!("mem_{}", self.next_id);
        self.next_id += 1;
        self.entries.push_back(QueuedEvent::new(&id, payload));

        Ok((
            EnqueueAck {
                id,
                depth: self.entries.len(),
            },
            evicted,
        ))
    }

    fn apply_overflow(&mut self) -> Result<Option<QueuedEvent>, SinkError> {
        match self.policy {
            OverflowPolicy::DropOldest => {
                let dropped = self.entries.pop_front();
                if dropped.is_some() {
                    self.dropped_count += 1;
                }
                Ok(dropped)
            }
            OverflowPolicy::DropNewest => {
                warn!(
                    depth = self.entries.len(),
                    "memory queue overflow: rejecting newest event"
                );
                Err(self.capacity_error())
            }
            OverflowPolicy::Reject => Err(self.capacity_error()),
        }
    }

    fn capacity_error(&self) -> SinkError {
        SinkError::CapacityExceeded {
            depth: self.entries.len(),
            max: self.max_size,
        }
    }

    /// Pop up to `n` events in FIFO order
    pub fn take_batch(&mut self, n: usize) -> Vec<QueuedEvent> {
        let count = n.min(self.entries.len());
        self.entries.drain(..count).collect()
    }

    /// Put a failed event back at the head so its retry outranks younger events
    ///
    /// Skips the capacity check: the buffer may transiently exceed `max_size`
    /// until the next enqueue applies the policy again.
    pub fn reinsert_front(&mut self, event: QueuedEvent) {
        self.entries.push_front(event);
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Age of the oldest buffered event
    pub fn oldest_age(&self) -> Option<Duration> {
        self.entries.front().map(QueuedEvent::age)
    }

    /// Events evicted by the drop-oldest policy so far
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Discard all buffered events
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_buffer(max_size: usize, policy: OverflowPolicy) -> EventBuffer {
        EventBuffer::new(max_size, policy)
    }

    #[test]
    fn test_fifo_order() {
        let mut buffer = make_buffer(10, OverflowPolicy::DropOldest);

        for i in 0..3 {
            buffer.push(json!({ "seq": i })).unwrap();
        }

        let batch = buffer.take_batch(3);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].payload["seq"], 0);
        assert_eq!(batch[1].payload["seq"], 1);
        assert_eq!(batch[2].payload["seq"], 2);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut buffer = make_buffer(10, OverflowPolicy::DropOldest);
        let (first, _) = buffer.push(json!({})).unwrap();
        let (second, _) = buffer.push(json!({})).unwrap();
        assert_eq!(first.id, "mem_1");
        assert_eq!(second.id, "mem_2");
    }

    #[test]
    fn test_drop_oldest_evicts_earliest() {
        let mut buffer = make_buffer(3, OverflowPolicy::DropOldest);

        for i in 0..3 {
            buffer.push(json!({ "seq": i })).unwrap();
        }
        let (ack, evicted) = buffer.push(json!({ "seq": 3 })).unwrap();

        let evicted = evicted.expect("oldest event should be evicted");
        assert_eq!(evicted.payload["seq"], 0);
        assert_eq!(ack.depth, 3);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.dropped_count(), 1);
    }

    #[test]
    fn test_reject_leaves_buffer_untouched() {
        let mut buffer = make_buffer(2, OverflowPolicy::Reject);

        buffer.push(json!({ "seq": 0 })).unwrap();
        buffer.push(json!({ "seq": 1 })).unwrap();
        let result = buffer.push(json!({ "seq": 2 }));

        assert!(matches!(
            result,
            Err(SinkError::CapacityExceeded { depth: 2, max: 2 })
        ));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.dropped_count(), 0);
    }

    #[test]
    fn test_drop_newest_behaves_like_reject() {
        let mut buffer = make_buffer(1, OverflowPolicy::DropNewest);

        buffer.push(json!({ "seq": 0 })).unwrap();
        let result = buffer.push(json!({ "seq": 1 }));

        assert!(matches!(result, Err(SinkError::CapacityExceeded { .. })));
        assert_eq!(buffer.len(), 1);
        let remaining = buffer.take_batch(1);
        assert_eq!(remaining[0].payload["seq"], 0);
    }

    #[test]
    fn test_reinsert_front_outranks_fresh_events() {
        let mut buffer = make_buffer(10, OverflowPolicy::DropOldest);

        buffer.push(json!({ "seq": 0 })).unwrap();
        buffer.push(json!({ "seq": 1 })).unwrap();

        let mut batch = buffer.take_batch(1);
        let mut retried = batch.remove(0);
        retried.retry_count += 1;
        buffer.reinsert_front(retried);

        let next = buffer.take_batch(2);
        assert_eq!(next[0].payload["seq"], 0);
        assert_eq!(next[0].retry_count, 1);
        assert_eq!(next[1].payload["seq"], 1);
    }

    #[test]
    fn test_reinsert_may_exceed_capacity() {
        let mut buffer = make_buffer(1, OverflowPolicy::Reject);

        buffer.push(json!({ "seq": 0 })).unwrap();
        let retried = buffer.take_batch(1).remove(0);
        buffer.push(json!({ "seq": 1 })).unwrap();
        buffer.reinsert_front(retried);

        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_take_batch_bounded_by_len() {
        let mut buffer = make_buffer(10, OverflowPolicy::DropOldest);
        buffer.push(json!({})).unwrap();

        let batch = buffer.take_batch(50);
        assert_eq!(batch.len(), 1);
        assert!(buffer.is_empty());
        assert!(buffer.oldest_age().is_none());
    }
}

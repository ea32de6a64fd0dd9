//! # Memory Queue
//!
//! In-process admission and delivery engine for telemetry events.
//!
//! A bounded FIFO buffer accepts events without ever blocking the producer,
//! a recurring drain tick hands batches to a single injected consumer under a
//! hard concurrency cap, failed sends retry with bounded attempts, and an
//! adaptive throttle paces deliveries from observed downstream health.
//!
//! The buffer is memory-only and intentionally volatile: nothing survives a
//! process restart, and `destroy` discards whatever is still buffered.

mod buffer;
mod queue;
mod throttle;

pub use buffer::EventBuffer;
pub use queue::MemoryQueue;
pub use throttle::ThrottleController;

//! # Dispatcher
//!
//! Public entry point for submitting telemetry events: the buffered fast path
//! through the memory queue, and the direct path with transport resolution,
//! latency thresholds, and a hard deadline. Transports are cached per kind in
//! an injected registry with single-flight construction.

mod dispatcher;
mod downstream;
mod registry;
mod transports;

pub use dispatcher::{Dispatcher, SendAck};
pub use downstream::DownstreamSender;
pub use registry::{AdapterRegistry, DefaultTransportFactory};
pub use transports::{FileTransport, LogTransport, NetworkTransport, WireFormat};

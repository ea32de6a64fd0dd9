//! Dispatcher configuration that can be shared across crates.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Bundled downstream transport implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Log events via tracing (debugging and demos)
    Log,
    /// Append events as NDJSON to a file
    File,
    /// Forward events over UDP
    Network,
}

impl TransportKind {
    /// Stable name used for cache keys and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Log => "log",
            TransportKind::File => "file",
            TransportKind::Network => "network",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatcher configuration
///
/// A missing `transport` is explicitly non-fatal: buffered callers still get
/// an "accepted" response while failure visibility is deferred to the health
/// surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// Downstream transport selector
    pub transport: Option<TransportKind>,

    /// Route every send through the direct path instead of the memory queue
    pub disable_buffering: bool,

    /// Hard deadline for the direct path in milliseconds
    pub direct_send_timeout_ms: u64,

    /// Transport-specific parameters (addr, path, format, ...)
    pub transport_params: HashMap<String, String>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            transport: None,
            disable_buffering: false,
            direct_send_timeout_ms: 3_000,
            transport_params: HashMap::new(),
        }
    }
}

//! NetworkTransport - UDP fire-and-forget event forwarding

use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use chrono::Utc;
use contracts::{PushReceipt, QueueTransport, SinkError};
use serde_json::Value;
use tokio::net::UdpSocket;
use tracing::{debug, instrument};

/// Serialization format for network transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// JSON (human-readable, larger)
    #[default]
    Json,
    /// Bincode (binary, compact)
    Bincode,
}

/// Configuration for NetworkTransport
#[derive(Debug, Clone)]
pub struct NetworkTransportConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Serialization format
    pub format: WireFormat,
    /// Max datagram size (UDP typically 65507 for IPv4)
    pub max_datagram: usize,
}

impl NetworkTransportConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{addr_str}': {e}"))?;

        let format = match params.get("format").map(String::as_str) {
            Some("bincode") => WireFormat::Bincode,
            Some("json") | None => WireFormat::Json,
            Some(other) => return Err(format!("unknown format '{other}'")),
        };

        let max_datagram = params
            .get("max_datagram")
            .and_then(|s| s.parse().ok())
            .unwrap_or(65000);

        Ok(Self {
            addr,
            format,
            max_datagram,
        })
    }
}

/// Transport that forwards events over UDP
pub struct NetworkTransport {
    name: String,
    config: NetworkTransportConfig,
    socket: UdpSocket,
}

impl NetworkTransport {
    /// Create a new NetworkTransport bound to an ephemeral local port
    pub async fn new(
        name: impl Into<String>,
        config: NetworkTransportConfig,
    ) -> std::io::Result<Self> {
        let name = name.into();
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(&config.addr).await?;

        debug!(
            transport = %name,
            target = %config.addr,
            "network transport connected"
        );

        Ok(Self {
            name,
            config,
            socket,
        })
    }

    /// Create from params map (for the factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, SinkError> {
        let config = NetworkTransportConfig::from_params(params)
            .map_err(|e| SinkError::transport_init("network", e))?;

        Self::new(name, config)
            .await
            .map_err(|e| SinkError::transport_init("network", e.to_string()))
    }

    fn encode(&self, event: &Value) -> Result<Vec<u8>, String> {
        match self.config.format {
            WireFormat::Json => serde_json::to_vec(event).map_err(|e| format!("json error: {e}")),
            WireFormat::Bincode => {
                bincode::serialize(event).map_err(|e| format!("bincode error: {e}"))
            }
        }
    }
}

#[async_trait]
impl QueueTransport for NetworkTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_transport_push",
        skip(self, event),
        fields(transport = %self.name)
    )]
    async fn push(&self, event: Value) -> Result<PushReceipt, SinkError> {
        let data = self
            .encode(&event)
            .map_err(|e| SinkError::send_failed(&self.name, e))?;

        if data.len() > self.config.max_datagram {
            return Err(SinkError::send_failed(
                &self.name,
                format!(
                    "event of {} bytes exceeds datagram limit {}",
                    data.len(),
                    self.config.max_datagram
                ),
            ));
        }

        let sent = self.socket.send(&data).await?;
        debug!(transport = %self.name, bytes = sent, "event sent");

        Ok(PushReceipt {
            transport: self.name.clone(),
            accepted_at: Utc::now().to_rfc3339(),
            detail: Some(format!("{sent} bytes to {}", self.config.addr)),
        })
    }
}

//! NDJSON event sources - file or stdin readers feeding the ingest loop.

use async_channel::{bounded, Receiver, Sender};
use contracts::IngestOptions;
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::CliError;

/// Start the configured event source
///
/// Reads one JSON document per line and forwards parsed events into the
/// returned channel. Malformed lines are skipped with a warning.
pub(crate) async fn spawn_reader(
    options: &IngestOptions,
) -> Result<(Receiver<Value>, JoinHandle<()>), CliError> {
    let (tx, rx) = bounded(options.channel_capacity);

    let task = match &options.source {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| CliError::source(path.display().to_string(), e.to_string()))?;
            info!(path = %path.display(), "Reading events from file");
            spawn_forwarder(BufReader::new(file), tx, path)
        }
        None => {
            info!("Reading events from stdin");
            spawn_forwarder(BufReader::new(tokio::io::stdin()), tx, Path::new("<stdin>"))
        }
    };

    Ok((rx, task))
}

fn spawn_forwarder<R>(reader: R, tx: Sender<Value>, origin: &Path) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let origin = origin.display().to_string();
    tokio::spawn(async move {
        if let Err(e) = forward_lines(reader, tx).await {
            warn!(origin = %origin, error = %e, "Event source failed");
        }
        debug!(origin = %origin, "Event source finished");
    })
}

async fn forward_lines<R>(reader: R, tx: Sender<Value>) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(event) => {
                // Receiver gone means the service stopped; stop reading
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed event line");
            }
        }
    }

    Ok(())
}

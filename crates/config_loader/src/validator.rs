//! Blueprint validation beyond what deserialization can express.

use contracts::{SinkBlueprint, SinkError, TransportKind};
use validator::Validate;

/// Validate a parsed blueprint
pub(crate) fn validate(blueprint: &SinkBlueprint) -> Result<(), SinkError> {
    blueprint
        .queue
        .validate()
        .map_err(|e| SinkError::config_validation("queue", e.to_string()))?;

    if blueprint.queue.batch_size > blueprint.queue.max_size {
        return Err(SinkError::config_validation(
            "queue.batch_size",
            "batch_size cannot exceed max_size",
        ));
    }

    if blueprint.dispatch.direct_send_timeout_ms == 0 {
        return Err(SinkError::config_validation(
            "dispatch.direct_send_timeout_ms",
            "direct send timeout must be positive",
        ));
    }

    if blueprint.ingest.channel_capacity == 0 {
        return Err(SinkError::config_validation(
            "ingest.channel_capacity",
            "channel capacity must be positive",
        ));
    }

    if blueprint.dispatch.transport == Some(TransportKind::Network)
        && !blueprint.dispatch.transport_params.contains_key("addr")
    {
        return Err(SinkError::config_validation(
            "dispatch.transport_params.addr",
            "network transport requires an 'addr' parameter",
        ));
    }

    Ok(())
}

//! Event validation capability - upstream of the dispatcher.

use serde_json::Value;

/// Validation gate events must pass before they reach dispatch
pub trait EventValidator {
    /// Whether the event is acceptable for delivery
    fn is_valid(&self, event: &Value) -> bool;
}

/// Structural check for player telemetry events
///
/// Requires an object carrying `event` and `sessionId` strings and a numeric
/// `timestamp`. Full schema validation belongs to the edge services upstream
/// of this sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerEventValidator;

impl EventValidator for PlayerEventValidator {
    fn is_valid(&self, event: &Value) -> bool {
        let Some(object) = event.as_object() else {
            return false;
        };

        object.get("event").is_some_and(Value::is_string)
            && object.get("sessionId").is_some_and(Value::is_string)
            && object.get("timestamp").is_some_and(Value::is_number)
    }
}

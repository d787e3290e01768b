//! The unit of transport and the route context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A timestamped record routed by the engine.
///
/// The `data` payload is opaque: whatever the submitter serialises
/// round-trips to the consumer as a decoded [`Value`]. The engine never
/// looks inside it.
///
/// Field names on the wire are capitalised (`Spawned`, `Topic`,
/// `Producer`, `Data`) and case-sensitive; this is the contract the
/// HTTP ingress speaks.
///
/// # Example
///
/// ```
/// use axon_event::Event;
/// use serde_json::json;
///
/// let event = Event::new("probe-7", "sensors/temp", json!({ "celsius": 21.4 }));
/// let wire = serde_json::to_string(&event).unwrap();
/// assert!(wire.contains("\"Topic\":\"sensors/temp\""));
///
/// let back: Event = serde_json::from_str(&wire).unwrap();
/// assert_eq!(back, event);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Wall-clock timestamp at submission, RFC3339 on the wire.
    #[serde(rename = "Spawned")]
    pub spawned: DateTime<Utc>,

    /// Name of the routing target. Empty topics are dropped by the
    /// dispatcher; unknown topics are a logged no-op, not an error.
    #[serde(rename = "Topic")]
    pub topic: String,

    /// Identifies the source. Informational only — producers are not
    /// required to be registered with the engine.
    #[serde(rename = "Producer")]
    pub producer: String,

    /// Opaque payload.
    #[serde(rename = "Data")]
    pub data: Value,
}

impl Event {
    /// Builds an event stamped with the current wall-clock time.
    #[must_use]
    pub fn new(producer: impl Into<String>, topic: impl Into<String>, data: Value) -> Self {
        Self {
            spawned: Utc::now(),
            topic: topic.into(),
            producer: producer.into(),
            data,
        }
    }
}

/// Context handed to a route function.
///
/// The route only sees the event that occurred; there is no channel back
/// to the sender, so any conversation state must be kept by the route
/// itself.
#[derive(Debug, Clone)]
pub struct Context {
    /// The event that triggered the route.
    pub event: Event,
}

//! The receiving side of the engine.

use crate::Event;
use std::fmt;
use std::sync::Arc;

/// Something that receives an event.
///
/// Handlers must tolerate concurrent invocation: a handler subscribed to
/// several topics may run from multiple parallel dispatches at once, and
/// Broadcast fan-out runs sibling handlers in parallel.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// An identified handler registration.
///
/// The id is the unit of identity in the consumer registry: registering
/// a second consumer under the same id replaces the stored handler
/// (existing per-topic subscriptions keep the handler they captured at
/// subscribe time).
#[derive(Clone)]
pub struct Consumer {
    /// Unique id within the engine.
    pub id: String,
    /// The handler invoked for each delivered event.
    pub handler: EventHandler,
}

impl Consumer {
    /// Wraps a closure into a consumer registration.
    ///
    /// # Example
    ///
    /// ```
    /// use axon_event::{Consumer, Event};
    ///
    /// let c = Consumer::new("audit", |event: &Event| {
    ///     eprintln!("{}: {}", event.topic, event.data);
    /// });
    /// assert_eq!(c.id, "audit");
    /// ```
    #[must_use]
    pub fn new(id: impl Into<String>, handler: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer").field("id", &self.id).finish_non_exhaustive()
    }
}

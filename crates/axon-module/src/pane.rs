//! The capability object handed to modules.

use crate::PaneError;
use axon_event::{Consumer, Event};
use serde_json::Value;
use std::fmt::Debug;

/// Scoped engine access for a module.
///
/// The pane is the whole of a module's reach into the engine: it can
/// subscribe consumers, publish as itself, forward foreign events, probe
/// topic existence and peek other modules' meta slots. It cannot create
/// or delete topics, register modules, or drive the engine lifecycle.
///
/// Implementations are provided by the runtime; modules and their tests
/// may substitute their own (see [`testing`](crate::testing)).
pub trait Pane: Send + Sync + Debug {
    /// The name of the module this pane is bound to.
    fn module_name(&self) -> &str;

    /// Subscribes consumers to a topic.
    ///
    /// With `register` set, the consumers are registered with the engine
    /// first; subscription requires a registered id, so passing `true`
    /// is always safe, at the price of touching the consumer registry.
    ///
    /// Ids are processed in order; the first failure aborts, leaving
    /// earlier subscriptions in place.
    ///
    /// # Errors
    ///
    /// [`PaneError::UnknownTopic`] or [`PaneError::UnknownConsumer`].
    fn subscribe_to(
        &self,
        topic: &str,
        consumers: Vec<Consumer>,
        register: bool,
    ) -> Result<(), PaneError>;

    /// Publishes raw data onto a topic as this module's producer
    /// (`<module>.producer`).
    ///
    /// Fire-and-forget: a submission that fails (engine not running) is
    /// logged by the runtime, not returned. Blocks until the dispatch
    /// worker takes the event.
    fn submit_to(&self, topic: &str, data: Value);

    /// Places a pre-formed event onto the bus verbatim, preserving its
    /// producer and timestamp. Useful for forwarding events through a
    /// module without obscuring their origin.
    fn submit_event(&self, event: Event);

    /// Returns whether the engine currently knows `topic`.
    fn contains_topic(&self, topic: &str) -> bool;

    /// Peeks another module's meta slot. Returns `Value::Null` when the
    /// module is unknown or has no meta stored.
    fn module_meta(&self, module: &str) -> Value;

    /// Clones this pane into a boxed trait object.
    fn clone_box(&self) -> Box<dyn Pane>;
}

impl Clone for Box<dyn Pane> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

//! The runtime's [`Pane`] implementation.

use super::engine::Shared;
use axon_event::{Consumer, Event};
use axon_module::{Pane, PaneError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Capability object handed to a module by `Engine::use_module`.
///
/// Holds the engine's shared state, never the engine itself: a module
/// cannot reach lifecycle control, topic deletion or other modules'
/// registrations through its pane.
#[derive(Clone)]
pub(crate) struct EnginePane {
    module: String,
    shared: Arc<Shared>,
}

impl EnginePane {
    pub(crate) fn new(module: String, shared: Arc<Shared>) -> Self {
        Self { module, shared }
    }
}

impl fmt::Debug for EnginePane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnginePane")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl Pane for EnginePane {
    fn module_name(&self) -> &str {
        &self.module
    }

    fn subscribe_to(
        &self,
        topic: &str,
        consumers: Vec<Consumer>,
        register: bool,
    ) -> Result<(), PaneError> {
        for consumer in consumers {
            let id = consumer.id.clone();
            if register {
                self.shared.register(consumer);
            }
            self.shared.subscribe_one(topic, &id)?;
        }
        Ok(())
    }

    fn submit_to(&self, topic: &str, data: Value) {
        let event = Event::new(format!("{}.producer", self.module), topic, data);
        if let Err(err) = self.shared.submit_event(event) {
            warn!(module = %self.module, topic, error = %err, "module submission dropped");
        }
    }

    fn submit_event(&self, event: Event) {
        let topic = event.topic.clone();
        if let Err(err) = self.shared.submit_event(event) {
            warn!(module = %self.module, topic = %topic, error = %err, "forwarded event dropped");
        }
    }

    fn contains_topic(&self, topic: &str) -> bool {
        self.shared.contains_topic(topic)
    }

    fn module_meta(&self, module: &str) -> Value {
        self.shared.module_meta(module)
    }

    fn clone_box(&self) -> Box<dyn Pane> {
        Box::new(self.clone())
    }
}

//! Test doubles for module authors.
//!
//! [`RecordingPane`] stands in for the runtime's pane in unit tests: it
//! records every submission and answers topic probes from a fixed set,
//! so a module can be exercised without an engine.

use crate::{Pane, PaneError};
use axon_event::{Consumer, Event};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// A pane that records what a module does with it.
///
/// # Example
///
/// ```
/// use axon_module::testing::RecordingPane;
/// use axon_module::Pane;
/// use axon_event::Event;
/// use serde_json::json;
///
/// let pane = RecordingPane::new("mod", ["known"]);
/// assert!(pane.contains_topic("known"));
/// assert!(!pane.contains_topic("other"));
///
/// pane.submit_event(Event::new("p", "known", json!(1)));
/// assert_eq!(pane.submitted().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingPane {
    module: String,
    topics: Arc<HashSet<String>>,
    submitted: Arc<Mutex<Vec<Event>>>,
}

impl RecordingPane {
    /// A pane for module `module` that recognises the given topics.
    #[must_use]
    pub fn new<I, S>(module: impl Into<String>, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module: module.into(),
            topics: Arc::new(topics.into_iter().map(Into::into).collect()),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Everything submitted through this pane, in order.
    #[must_use]
    pub fn submitted(&self) -> Vec<Event> {
        self.submitted.lock().clone()
    }
}

impl Pane for RecordingPane {
    fn module_name(&self) -> &str {
        &self.module
    }

    fn subscribe_to(
        &self,
        topic: &str,
        _consumers: Vec<Consumer>,
        _register: bool,
    ) -> Result<(), PaneError> {
        if self.topics.contains(topic) {
            Ok(())
        } else {
            Err(PaneError::UnknownTopic(topic.to_string()))
        }
    }

    fn submit_to(&self, topic: &str, data: Value) {
        let producer = format!("{}.producer", self.module);
        self.submitted.lock().push(Event::new(producer, topic, data));
    }

    fn submit_event(&self, event: Event) {
        self.submitted.lock().push(event);
    }

    fn contains_topic(&self, topic: &str) -> bool {
        self.topics.contains(topic)
    }

    fn module_meta(&self, _module: &str) -> Value {
        Value::Null
    }

    fn clone_box(&self) -> Box<dyn Pane> {
        Box::new(self.clone())
    }
}

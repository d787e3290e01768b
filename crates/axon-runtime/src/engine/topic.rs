//! Runtime topic state and subscriber selection.

use super::error::EngineError;
use axon_event::{Distribution, EventHandler, Selection, TopicCfg};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;

/// Live state of one topic in the registry.
///
/// The subscriber list stores `Option<EventHandler>`: a `None` slot is a
/// soft-deleted subscriber, skipped by every selection routine. Keeping
/// the slot (instead of compacting the list) preserves round-robin
/// cursor positions for the remaining subscribers.
pub(crate) struct Topic {
    pub(crate) distribution: Distribution,
    pub(crate) selection: Selection,
    pub(crate) subscribers: Vec<Option<EventHandler>>,
    /// Round-robin cursor. Owns its own lock so a RoundRobin delivery
    /// never touches the topic registry lock.
    cursor: Arc<Mutex<usize>>,
}

impl Topic {
    pub(crate) fn from_cfg(cfg: &TopicCfg) -> Self {
        Self {
            distribution: cfg.distribution,
            selection: cfg.selection,
            subscribers: Vec::new(),
            cursor: Arc::new(Mutex::new(0)),
        }
    }

    /// Captures everything dispatch needs, so the registry lock can be
    /// released before any handler runs. Handler slots are `Arc`s; the
    /// clone is shallow.
    pub(crate) fn snapshot(&self, name: &str) -> TopicSnapshot {
        TopicSnapshot {
            name: name.to_string(),
            distribution: self.distribution,
            selection: self.selection,
            subscribers: self.subscribers.clone(),
            cursor: Arc::clone(&self.cursor),
        }
    }
}

/// Immutable dispatch view of a topic.
///
/// An event dequeued before a topic mutation (delete, late subscribe)
/// keeps delivering to the list captured here.
pub(crate) struct TopicSnapshot {
    pub(crate) name: String,
    pub(crate) distribution: Distribution,
    pub(crate) selection: Selection,
    pub(crate) subscribers: Vec<Option<EventHandler>>,
    cursor: Arc<Mutex<usize>>,
}

impl TopicSnapshot {
    pub(crate) fn has_subscriber(&self) -> bool {
        self.subscribers.iter().any(Option::is_some)
    }

    /// Advances the round-robin cursor to the next live subscriber and
    /// returns its index. Skips `None` slots, bounded by one full pass.
    ///
    /// The cursor is shared with the registry's topic, so consecutive
    /// deliveries rotate even though each works on its own snapshot.
    pub(crate) fn rr_next(&self) -> Result<usize, EngineError> {
        let mut cursor = self.cursor.lock();

        if *cursor >= self.subscribers.len() {
            *cursor = 0;
        }

        let mut checked = 0;
        while self.subscribers.get(*cursor).map_or(true, Option::is_none) {
            *cursor += 1;
            if *cursor >= self.subscribers.len() {
                *cursor = 0;
            }
            checked += 1;
            if checked > self.subscribers.len() {
                return Err(EngineError::NoSubscriber(self.name.clone()));
            }
        }

        let selected = *cursor;
        *cursor += 1;
        Ok(selected)
    }

    /// Picks a uniformly random live subscriber index. Not cryptographic.
    pub(crate) fn random_subscriber(&self) -> Result<usize, EngineError> {
        let live: Vec<usize> = self
            .subscribers
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect();

        if live.is_empty() {
            return Err(EngineError::NoSubscriber(self.name.clone()));
        }

        Ok(live[rand::thread_rng().gen_range(0..live.len())])
    }
}

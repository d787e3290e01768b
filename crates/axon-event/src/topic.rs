//! Topic configuration: distribution and selection policies.

use serde::{Deserialize, Serialize};

/// How a topic spreads an event over its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// Deliver to every subscriber, in parallel.
    Broadcast,
    /// Deliver to exactly one subscriber chosen by the [`Selection`] rule.
    Direct,
}

/// Which subscriber a [`Distribution::Direct`] topic picks.
///
/// Meaningless for Broadcast topics; kept in the config so a topic can
/// be re-declared Direct without losing its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// First live subscriber in registration order.
    Arbitrary,
    /// Subscribers in turn, cursor wrapping modulo the list length.
    RoundRobin,
    /// Uniformly random live subscriber. Not cryptographic.
    Random,
}

/// Declarative topic description handed to the engine at creation time.
///
/// Defaults to Broadcast with Arbitrary selection; the builder methods
/// chain, mirroring how topics read at call sites:
///
/// ```
/// use axon_event::{Distribution, Selection, TopicCfg};
///
/// let cfg = TopicCfg::new("jobs").direct().round_robin();
/// assert_eq!(cfg.distribution, Distribution::Direct);
/// assert_eq!(cfg.selection, Selection::RoundRobin);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCfg {
    /// Unique topic name; duplicate creation fails.
    pub name: String,
    /// Fan-out shape.
    pub distribution: Distribution,
    /// Selection rule, used when `distribution` is Direct.
    pub selection: Selection,
}

impl TopicCfg {
    /// A Broadcast/Arbitrary topic with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            distribution: Distribution::Broadcast,
            selection: Selection::Arbitrary,
        }
    }

    /// Switches the topic to Broadcast distribution.
    #[must_use]
    pub fn broadcast(mut self) -> Self {
        self.distribution = Distribution::Broadcast;
        self
    }

    /// Switches the topic to Direct distribution.
    #[must_use]
    pub fn direct(mut self) -> Self {
        self.distribution = Distribution::Direct;
        self
    }

    /// Selects the first live subscriber (the default).
    #[must_use]
    pub fn arbitrary(mut self) -> Self {
        self.selection = Selection::Arbitrary;
        self
    }

    /// Selects subscribers in turn.
    #[must_use]
    pub fn round_robin(mut self) -> Self {
        self.selection = Selection::RoundRobin;
        self
    }

    /// Selects a uniformly random live subscriber.
    #[must_use]
    pub fn random(mut self) -> Self {
        self.selection = Selection::Random;
        self
    }
}

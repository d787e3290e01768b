//! Engine layer errors.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`EngineError::AlreadyRunning`] | `ENGINE_ALREADY_RUNNING` | No |
//! | [`EngineError::NotRunning`] | `ENGINE_NOT_RUNNING` | No |
//! | [`EngineError::DuplicateTopic`] | `ENGINE_DUPLICATE_TOPIC` | No |
//! | [`EngineError::UnknownTopic`] | `ENGINE_UNKNOWN_TOPIC` | Yes |
//! | [`EngineError::UnknownConsumer`] | `ENGINE_UNKNOWN_CONSUMER` | No |
//! | [`EngineError::UnknownModule`] | `ENGINE_UNKNOWN_MODULE` | No |
//! | [`EngineError::DuplicateModule`] | `ENGINE_DUPLICATE_MODULE` | No |
//! | [`EngineError::Module`] | `ENGINE_MODULE` | delegated |
//! | [`EngineError::NoSubscriber`] | `ENGINE_NO_SUBSCRIBER` | Yes |
//!
//! `UnknownTopic` and `NoSubscriber` are recoverable: topics and
//! subscriptions appear at runtime, so a retry after wiring completes
//! may succeed. Lifecycle misuse will return the same answer forever on
//! the same engine instance.

use axon_module::{ModuleError, PaneError};
use axon_types::ErrorCode;
use thiserror::Error;

/// Engine layer error.
///
/// # Example
///
/// ```
/// use axon_runtime::EngineError;
/// use axon_types::ErrorCode;
///
/// let err = EngineError::NotRunning;
/// assert_eq!(err.code(), "ENGINE_NOT_RUNNING");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start` on an engine that is not freshly created.
    #[error("engine already running")]
    AlreadyRunning,

    /// `stop` or a submission while the engine is not running.
    #[error("engine not running")]
    NotRunning,

    /// `create_topic` on an existing name.
    #[error("duplicate topic: {0}")]
    DuplicateTopic(String),

    /// Subscription against a topic the engine does not know.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// Subscription naming an unregistered consumer id.
    #[error("unknown consumer: {0}")]
    UnknownConsumer(String),

    /// Meta write against an unregistered module.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// `use_module` under a name that is already taken.
    #[error("duplicate module: {0}")]
    DuplicateModule(String),

    /// A module failed to come up during `start`.
    #[error("module {name} failed: {source}")]
    Module {
        name: String,
        #[source]
        source: ModuleError,
    },

    /// A Direct topic had no live subscriber to select. Internal:
    /// dispatch surfaces this as a debug log, never to callers.
    #[error("no subscriber found for topic: {0}")]
    NoSubscriber(String),
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "ENGINE_ALREADY_RUNNING",
            Self::NotRunning => "ENGINE_NOT_RUNNING",
            Self::DuplicateTopic(_) => "ENGINE_DUPLICATE_TOPIC",
            Self::UnknownTopic(_) => "ENGINE_UNKNOWN_TOPIC",
            Self::UnknownConsumer(_) => "ENGINE_UNKNOWN_CONSUMER",
            Self::UnknownModule(_) => "ENGINE_UNKNOWN_MODULE",
            Self::DuplicateModule(_) => "ENGINE_DUPLICATE_MODULE",
            Self::Module { .. } => "ENGINE_MODULE",
            Self::NoSubscriber(_) => "ENGINE_NO_SUBSCRIBER",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::UnknownTopic(_) | Self::NoSubscriber(_) => true,
            Self::Module { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Narrow failure set of a subscription, shared between the engine API
/// (maps to [`EngineError`]) and the pane (maps to [`PaneError`]).
#[derive(Debug, Clone)]
pub(crate) enum SubscribeError {
    UnknownTopic(String),
    UnknownConsumer(String),
}

impl From<SubscribeError> for EngineError {
    fn from(err: SubscribeError) -> Self {
        match err {
            SubscribeError::UnknownTopic(t) => Self::UnknownTopic(t),
            SubscribeError::UnknownConsumer(c) => Self::UnknownConsumer(c),
        }
    }
}

impl From<SubscribeError> for PaneError {
    fn from(err: SubscribeError) -> Self {
        match err {
            SubscribeError::UnknownTopic(t) => Self::UnknownTopic(t),
            SubscribeError::UnknownConsumer(c) => Self::UnknownConsumer(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_types::assert_error_codes;

    fn all_variants() -> Vec<EngineError> {
        vec![
            EngineError::AlreadyRunning,
            EngineError::NotRunning,
            EngineError::DuplicateTopic("t".into()),
            EngineError::UnknownTopic("t".into()),
            EngineError::UnknownConsumer("c".into()),
            EngineError::UnknownModule("m".into()),
            EngineError::DuplicateModule("m".into()),
            EngineError::Module {
                name: "m".into(),
                source: ModuleError::Startup("x".into()),
            },
            EngineError::NoSubscriber("t".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "ENGINE_");
    }

    #[test]
    fn module_recoverability_is_delegated() {
        let startup = EngineError::Module {
            name: "m".into(),
            source: ModuleError::Startup("x".into()),
        };
        assert!(!startup.is_recoverable());

        let io = EngineError::Module {
            name: "m".into(),
            source: ModuleError::Io(std::io::Error::other("bind")),
        };
        assert!(io.is_recoverable());
    }

    #[test]
    fn subscribe_error_maps_both_ways() {
        let engine: EngineError = SubscribeError::UnknownTopic("t".into()).into();
        assert_eq!(engine.code(), "ENGINE_UNKNOWN_TOPIC");

        let pane: PaneError = SubscribeError::UnknownConsumer("c".into()).into();
        assert_eq!(pane.code(), "PANE_UNKNOWN_CONSUMER");
    }
}

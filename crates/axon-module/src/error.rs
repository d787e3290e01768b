//! Module layer errors.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`PaneError::UnknownTopic`] | `PANE_UNKNOWN_TOPIC` | Yes |
//! | [`PaneError::UnknownConsumer`] | `PANE_UNKNOWN_CONSUMER` | No |
//! | [`ModuleError::Startup`] | `MODULE_STARTUP` | No |
//! | [`ModuleError::Io`] | `MODULE_IO` | Yes |
//!
//! `UnknownTopic` is recoverable because topics are created at runtime:
//! a module racing another module's topic declaration may succeed on
//! retry. An unknown consumer id is a wiring bug in the caller.

use axon_types::ErrorCode;
use thiserror::Error;

/// Failure of a [`Pane`](crate::Pane) operation.
#[derive(Debug, Clone, Error)]
pub enum PaneError {
    /// Subscription against a topic the engine does not know.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// Subscription naming a consumer id that was never registered.
    #[error("unknown consumer: {0}")]
    UnknownConsumer(String),
}

impl ErrorCode for PaneError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownTopic(_) => "PANE_UNKNOWN_TOPIC",
            Self::UnknownConsumer(_) => "PANE_UNKNOWN_CONSUMER",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownTopic(_))
    }
}

/// Failure raised by a module's own lifecycle.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The module could not bring itself up.
    #[error("module startup failed: {0}")]
    Startup(String),

    /// An underlying I/O operation failed (bind, accept, ...).
    #[error("module io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for ModuleError {
    fn code(&self) -> &'static str {
        match self {
            Self::Startup(_) => "MODULE_STARTUP",
            Self::Io(_) => "MODULE_IO",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

//! Route producer type.
//!
//! A route is the smallest unit of useful engine usage: one topic, one
//! consumer function, one producer closure handed back to the caller.
//! `Engine::add_route` wires all three so simple cases never touch the
//! register/subscribe/submit dance.

use super::error::EngineError;
use serde_json::Value;

/// Producer closure returned by `Engine::add_route`.
///
/// Emits to the route's topic as `prod:<topic>`; callable from any
/// thread. Fails with [`EngineError::NotRunning`] outside the Running
/// lifecycle.
pub type Producer = Box<dyn Fn(Value) -> Result<(), EngineError> + Send + Sync>;

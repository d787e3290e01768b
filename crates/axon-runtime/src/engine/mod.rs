//! Engine internals: registries, dispatch, pane, routes.
//!
//! Locking discipline, in acquisition order:
//!
//! 1. consumer registry lock
//! 2. topic registry lock
//! 3. module registry lock (only around `use_module` and meta access)
//!
//! The per-topic round-robin cursor has its own lock, taken only during
//! a RoundRobin delivery. Handlers always run with every engine lock
//! released — dispatch snapshots the subscriber list under the topic
//! lock and lets go before invoking anything.

#[allow(clippy::module_inception)]
mod engine;
mod error;
mod pane;
mod route;
mod topic;

pub use engine::{Engine, EngineCallbacks, INTERNAL_TOPIC};
pub use error::EngineError;
pub use route::Producer;

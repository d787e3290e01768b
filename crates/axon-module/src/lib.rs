//! Module surface of the axon engine.
//!
//! A module is a pluggable subsystem that participates in the event bus
//! as both producer and consumer — a TCP listener publishing accepted
//! connections, an HTTP ingress forwarding remote submissions. Modules
//! never hold a reference to the engine; they receive a [`Pane`], a
//! capability object exposing exactly the operations a module may call.
//!
//! ```text
//!            use_module(mod, topics)
//!  Engine ────────────────────────────► Module
//!    │        attach_pane(Box<dyn Pane>)   │
//!    │ ◄───────────────────────────────────┤
//!    │   submit_to / submit_event /        │
//!    │   subscribe_to / module_meta        │
//! ```
//!
//! The narrow surface bounds blast radius and makes modules trivially
//! replaceable: in tests a module runs against a recording pane (see
//! [`testing`]) with no engine at all.
//!
//! # Lifecycle
//!
//! Module lifecycle is slaved to the engine: [`Module::start`] runs
//! after the dispatch worker is up, so a module's first publishes are
//! guaranteed acceptable; [`Module::shutdown`] runs before the intake
//! closes, so its final publishes are not lost to a closed channel.

mod error;
mod module;
mod pane;
pub mod testing;

pub use error::{ModuleError, PaneError};
pub use module::Module;
pub use pane::Pane;

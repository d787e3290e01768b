//! Axon runtime — the event engine.
//!
//! This crate owns the dispatch core: the topic and consumer registries,
//! the single-writer intake channel, the per-topic delivery policies and
//! the module lifecycle. Frontends (the CLI, embedding applications)
//! depend on this crate; modules depend only on the SDK crates.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │                                                              │
//! │  consumers: id → handler       topics: name → policy + subs  │
//! │                                                              │
//! │  intake (rendezvous) ──► dispatch worker (single thread)     │
//! │                               │                              │
//! │              ┌────────────────┼──────────────┐               │
//! │              ▼                ▼              ▼               │
//! │         Broadcast        Direct/RR      Direct/Random        │
//! │      (thread per sub,   (cursor, one   (uniform, one         │
//! │       barrier per event) per event)     per event)           │
//! └──────────────────────────────────────────────────────────────┘
//!          ▲                                   │
//!          │ Pane (capability object)          │ handlers
//!     ┌────┴─────┐                        ┌────┴─────┐
//!     │ Modules  │                        │Consumers │
//!     └──────────┘                        └──────────┘
//! ```
//!
//! # Ordering guarantees
//!
//! A single worker drains the intake, so:
//!
//! - per topic, events are processed in submission order;
//! - for Broadcast topics, every subscriber of event N completes before
//!   event N+1 fans out (siblings within one fan-out run in parallel,
//!   in arbitrary order);
//! - for Direct topics, delivery is strictly ordered per topic;
//! - across topics, nothing is guaranteed.
//!
//! Submission blocks until the worker takes the event — the rendezvous
//! intake is the engine's only back-pressure mechanism.
//!
//! # Main types
//!
//! - [`Engine`]: registries, lifecycle, dispatch
//! - [`EngineCallbacks`]: optional observation hooks
//! - [`Producer`]: closure returned by [`Engine::add_route`]
//! - [`EngineError`]: engine layer errors (implements
//!   [`ErrorCode`](axon_types::ErrorCode))

mod engine;

pub use engine::{Engine, EngineCallbacks, EngineError, Producer, INTERNAL_TOPIC};

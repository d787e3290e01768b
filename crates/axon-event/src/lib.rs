//! Event types for the axon engine.
//!
//! This crate defines the unit of transport ([`Event`]), the receiving
//! side ([`Consumer`], [`EventHandler`]) and the per-topic delivery
//! policy ([`TopicCfg`]). It carries no runtime behaviour: the dispatch
//! machinery lives in `axon-runtime`, and modules depend only on this
//! crate plus `axon-module`.
//!
//! # Delivery model
//!
//! ```text
//!  Producer ──submit──► ┌────────────────────────┐
//!                       │        Engine          │
//!                       │  intake ─► dispatcher  │
//!                       └───────────┬────────────┘
//!                                   │ topic policy
//!                 ┌─────────────────┼─────────────────┐
//!                 ▼                 ▼                 ▼
//!            Broadcast       Direct/RoundRobin   Direct/Random
//!          (every handler)    (one, in turn)     (one, uniform)
//! ```
//!
//! # Wire format
//!
//! Events cross process boundaries (the HTTP ingress) as JSON with
//! capitalised field names; the payload is an arbitrary JSON value the
//! engine never inspects:
//!
//! ```json
//! {
//!   "Spawned": "2026-01-02T03:04:05Z",
//!   "Topic": "sensors/temp",
//!   "Producer": "probe-7",
//!   "Data": { "celsius": 21.4 }
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use axon_event::{Consumer, Event, TopicCfg};
//!
//! let cfg = TopicCfg::new("jobs").direct().round_robin();
//! assert_eq!(cfg.name, "jobs");
//!
//! let consumer = Consumer::new("worker-1", |event: &Event| {
//!     println!("got {} from {}", event.topic, event.producer);
//! });
//! assert_eq!(consumer.id, "worker-1");
//! ```

mod consumer;
mod event;
mod topic;

pub use consumer::{Consumer, EventHandler};
pub use event::{Context, Event};
pub use topic::{Distribution, Selection, TopicCfg};

//! Base types shared across the axon workspace.
//!
//! This crate sits at the bottom of the dependency graph:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SDK layer                              │
//! │  axon-types   : ErrorCode, code validation helpers ◄── HERE │
//! │  axon-event   : Event, Consumer, TopicCfg                   │
//! │  axon-module  : Module trait, Pane capability               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  axon-runtime : Engine, dispatch worker, routes             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  axon-ingress : HTTP ingress module                         │
//! │  axon-cli     : axond binary                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error type in the workspace implements [`ErrorCode`], giving
//! callers a stable machine-readable code and a recoverability hint
//! independent of the human-readable `Display` output.

mod error;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};

//! HTTP ingress module for the axon engine.
//!
//! The [`Endpoint`] is the representative engine module: a small HTTP
//! surface that turns remote submissions into bus events through its
//! pane. Two endpoints:
//!
//! | Method | Path | Body | Responses |
//! |--------|------|------|-----------|
//! | any | `/ping` | ignored | 200 fixed text |
//! | POST | `/submit` | envelope JSON | 200, 400 bad JSON / unknown topic, 401 auth, 503 not ready |
//!
//! The submission envelope wraps an event with optional opaque auth
//! material:
//!
//! ```json
//! { "Auth": "token-or-anything", "Event": { "Spawned": "...", "Topic": "...", "Producer": "...", "Data": {} } }
//! ```
//!
//! When an [`AuthCallback`] is configured, it alone decides acceptance;
//! a missing `Auth` field or a rejecting callback answers 401 and stops
//! there. Without a callback the envelope's auth material is ignored.
//!
//! The [`client`] helpers speak the same wire contract from the outside
//! and are what the `axond` CLI uses for its `ping` and `emit` verbs.

pub mod client;
mod endpoint;
mod error;

pub use endpoint::{
    AuthCallback, BoundAddr, Config, Endpoint, SubmitRequest, MODULE_NAME, PING_RESPONSE,
};
pub use error::IngressError;

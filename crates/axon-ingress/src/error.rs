//! Ingress layer errors.

use axon_types::ErrorCode;
use thiserror::Error;

/// Client-side failure talking to an ingress endpoint.
///
/// Server-side failures never surface as errors: the endpoint maps them
/// to HTTP status codes per the wire contract.
#[derive(Debug, Error)]
pub enum IngressError {
    /// Request could not be built or transported.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ErrorCode for IngressError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "INGRESS_TRANSPORT",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

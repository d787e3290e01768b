//! Client helpers speaking the ingress wire contract.
//!
//! Used by the `axond` CLI for its `ping` and `emit` verbs, and handy
//! for any process that wants to push events into a remote engine.

use crate::endpoint::{SubmitRequest, ENDPOINT_PING, ENDPOINT_SUBMIT};
use crate::IngressError;
use axon_event::Event;
use serde_json::Value;
use tracing::debug;

/// Status and body of a `/submit` exchange.
#[derive(Debug, Clone)]
pub struct SubmissionResponse {
    pub status: u16,
    pub body: String,
}

/// Outcome of a [`submit_ping`] run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PingReport {
    pub total: usize,
    pub failed: usize,
}

fn endpoint_url(address: &str, endpoint: &str) -> String {
    format!("http://{address}{endpoint}")
}

/// Submits an event without auth material.
///
/// # Errors
///
/// [`IngressError::Transport`] when the request cannot reach the
/// endpoint; HTTP-level rejections come back in the response status.
pub async fn submit_event(address: &str, event: &Event) -> Result<SubmissionResponse, IngressError> {
    send(
        address,
        &SubmitRequest {
            auth: None,
            event: event.clone(),
        },
    )
    .await
}

/// Submits an event with opaque auth material. The server-side
/// callback decides what the material means.
///
/// # Errors
///
/// [`IngressError::Transport`] when the request cannot reach the
/// endpoint.
pub async fn submit_event_with_auth(
    address: &str,
    event: &Event,
    auth: Value,
) -> Result<SubmissionResponse, IngressError> {
    send(
        address,
        &SubmitRequest {
            auth: Some(auth),
            event: event.clone(),
        },
    )
    .await
}

async fn send(address: &str, envelope: &SubmitRequest) -> Result<SubmissionResponse, IngressError> {
    let response = reqwest::Client::new()
        .post(endpoint_url(address, ENDPOINT_SUBMIT))
        .json(envelope)
        .send()
        .await?;

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_else(|_| String::from("{}"));
    Ok(SubmissionResponse { status, body })
}

/// Pings an endpoint `count` times, stopping early once `max_failures`
/// is reached (when given).
pub async fn submit_ping(address: &str, count: usize, max_failures: Option<usize>) -> PingReport {
    let client = reqwest::Client::new();
    let mut report = PingReport::default();

    for attempt in 0..count {
        debug!(address, attempt, total = count, "ping");
        let ok = match client.post(endpoint_url(address, ENDPOINT_PING)).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "ping failure");
                false
            }
        };

        report.total += 1;
        if !ok {
            report.failed += 1;
            if let Some(max) = max_failures {
                if report.failed >= max {
                    debug!(max, "reached fail limit");
                    return report;
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_format() {
        assert_eq!(
            endpoint_url("127.0.0.1:4096", ENDPOINT_SUBMIT),
            "http://127.0.0.1:4096/submit"
        );
    }

    #[tokio::test]
    async fn ping_against_nothing_counts_failures() {
        // Reserved port with nothing listening: every ping fails and
        // the limit short-circuits the run.
        let report = submit_ping("127.0.0.1:1", 10, Some(3)).await;
        assert_eq!(report.failed, 3);
        assert_eq!(report.total, 3);
    }
}

//! The ingress endpoint module.

use axon_event::Event;
use axon_module::{Module, ModuleError, Pane};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::Router;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Name the endpoint registers under.
pub const MODULE_NAME: &str = "ingress.http";

/// Fixed liveness body.
pub const PING_RESPONSE: &str = "Кто там?";

pub(crate) const ENDPOINT_PING: &str = "/ping";
pub(crate) const ENDPOINT_SUBMIT: &str = "/submit";

/// Submission envelope: an event plus optional opaque auth material.
///
/// `Auth` carries whatever the submitter chose to encode; the endpoint
/// hands it back to the configured [`AuthCallback`] untouched. A JSON
/// `null` and an absent field both decode to `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "Auth", default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<serde_json::Value>,
    #[serde(rename = "Event")]
    pub event: Event,
}

/// Decides whether a submission is accepted. Runs on the HTTP path;
/// keep it cheap.
pub type AuthCallback = Arc<dyn Fn(&SubmitRequest) -> bool + Send + Sync>;

/// Endpoint configuration.
#[derive(Clone)]
pub struct Config {
    /// Bind address, `host:port`.
    pub address: String,
    /// How long `shutdown` waits for outstanding requests.
    pub graceful_shutdown: Duration,
    /// Optional acceptance callback; `None` admits everything.
    pub auth: Option<AuthCallback>,
}

impl Config {
    /// Config binding `address` with a 5 second graceful shutdown and
    /// no auth.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            graceful_shutdown: Duration::from_secs(5),
            auth: None,
        }
    }

    /// Sets the graceful shutdown bound.
    #[must_use]
    pub fn with_graceful_shutdown(mut self, timeout: Duration) -> Self {
        self.graceful_shutdown = timeout;
        self
    }

    /// Installs an acceptance callback.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthCallback) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Observer for the address the endpoint actually bound.
///
/// Populated during module start; meaningful when the config asked for
/// port 0.
#[derive(Debug, Clone, Default)]
pub struct BoundAddr(Arc<Mutex<Option<SocketAddr>>>);

impl BoundAddr {
    /// The bound address, once the module has started.
    #[must_use]
    pub fn get(&self) -> Option<SocketAddr> {
        *self.0.lock()
    }
}

struct EndpointState {
    pane: RwLock<Option<Box<dyn Pane>>>,
    auth: Option<AuthCallback>,
}

/// HTTP ingress endpoint, registered with the engine as a module.
///
/// The server runs on its own thread with its own tokio runtime, so the
/// module works the same whether the embedding application is async or
/// not.
pub struct Endpoint {
    config: Config,
    state: Arc<EndpointState>,
    bound: BoundAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    // Mutex-wrapped: mpsc receivers are not Sync, modules must be.
    done_rx: Option<Mutex<Receiver<()>>>,
    server: Option<JoinHandle<()>>,
}

impl Endpoint {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let auth = config.auth.clone();
        Self {
            config,
            state: Arc::new(EndpointState {
                pane: RwLock::new(None),
                auth,
            }),
            bound: BoundAddr::default(),
            shutdown_tx: None,
            done_rx: None,
            server: None,
        }
    }

    /// Handle observing the address the listener ends up bound to.
    #[must_use]
    pub fn bound_addr(&self) -> BoundAddr {
        self.bound.clone()
    }
}

impl Module for Endpoint {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn attach_pane(&mut self, pane: Box<dyn Pane>) {
        let mut slot = self.state.pane.write();
        if slot.is_none() {
            *slot = Some(pane);
        }
    }

    fn start(&mut self) -> Result<(), ModuleError> {
        let listener = std::net::TcpListener::bind(&self.config.address)?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        *self.bound.0.lock() = Some(addr);
        info!(address = %addr, "ingress listening");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let state = Arc::clone(&self.state);

        self.server = Some(std::thread::spawn(move || {
            run_server(listener, state, shutdown_rx);
            let _ = done_tx.send(());
        }));
        self.shutdown_tx = Some(shutdown_tx);
        self.done_rx = Some(Mutex::new(done_rx));
        Ok(())
    }

    fn shutdown(&mut self) {
        info!("ingress shutting down");
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(done_rx) = self.done_rx.take() {
            match done_rx.into_inner().recv_timeout(self.config.graceful_shutdown) {
                Ok(()) => {
                    if let Some(server) = self.server.take() {
                        let _ = server.join();
                    }
                }
                Err(_) => {
                    warn!("graceful shutdown deadline exceeded, abandoning outstanding requests");
                }
            }
        }
    }
}

/// Owns the server runtime for the lifetime of the listener. Runs on a
/// dedicated thread so the runtime is built and dropped outside any
/// caller's async context.
fn run_server(
    listener: std::net::TcpListener,
    state: Arc<EndpointState>,
    shutdown_rx: oneshot::Receiver<()>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to build ingress runtime");
            return;
        }
    };

    runtime.block_on(async move {
        let listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(err) => {
                error!(error = %err, "failed to adopt ingress listener");
                return;
            }
        };

        let serve = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        if let Err(err) = serve.await {
            error!(error = %err, "ingress server error");
        }
    });
}

fn router(state: Arc<EndpointState>) -> Router {
    Router::new()
        .route(ENDPOINT_PING, any(handle_ping))
        .route(ENDPOINT_SUBMIT, post(handle_submit))
        .with_state(state)
}

async fn handle_ping() -> (StatusCode, &'static str) {
    debug!("ping");
    (StatusCode::OK, PING_RESPONSE)
}

async fn handle_submit(State(state): State<Arc<EndpointState>>, body: String) -> Response {
    let Some(pane) = state.pane.read().clone() else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    debug!(bytes = body.len(), "submission received");

    let request: SubmitRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, "submission parse failure");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Some(auth) = &state.auth {
        if request.auth.is_none() {
            warn!(
                topic = %request.event.topic,
                producer = %request.event.producer,
                "submission rejected - missing auth"
            );
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if !auth(&request) {
            warn!(
                topic = %request.event.topic,
                producer = %request.event.producer,
                "submission auth failure"
            );
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let event = request.event;
    if !pane.contains_topic(&event.topic) {
        return (StatusCode::BAD_REQUEST, "unknown topic").into_response();
    }

    // submit_event blocks on the rendezvous intake; keep that off the
    // async workers.
    let submitting = pane.clone();
    if tokio::task::spawn_blocking(move || submitting.submit_event(event))
        .await
        .is_err()
    {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    StatusCode::OK.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_module::testing::RecordingPane;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn app(pane: Option<RecordingPane>, auth: Option<AuthCallback>) -> Router {
        let state = Arc::new(EndpointState {
            pane: RwLock::new(pane.map(|p| Box::new(p) as Box<dyn Pane>)),
            auth,
        });
        router(state)
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    fn submit(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(ENDPOINT_SUBMIT)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn envelope(auth: Option<serde_json::Value>, topic: &str) -> String {
        serde_json::to_string(&SubmitRequest {
            auth,
            event: Event::new("remote", topic, json!({ "n": 1 })),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn ping_answers_fixed_body() {
        for method in ["GET", "POST"] {
            let request = Request::builder()
                .method(method)
                .uri(ENDPOINT_PING)
                .body(Body::empty())
                .unwrap();
            let (status, body) = call(app(Some(RecordingPane::new("m", ["t"])), None), request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, PING_RESPONSE);
        }
    }

    #[tokio::test]
    async fn submit_without_pane_is_503() {
        let (status, _) = call(app(None, None), submit(envelope(None, "t"))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn submit_malformed_json_is_400() {
        let pane = RecordingPane::new("m", ["t"]);
        let (status, _) = call(app(Some(pane), None), submit("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_unknown_topic_is_400_with_body() {
        let pane = RecordingPane::new("m", ["t"]);
        let (status, body) = call(app(Some(pane), None), submit(envelope(None, "ghost"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "unknown topic");
    }

    #[tokio::test]
    async fn submit_forwards_event_through_pane() {
        let pane = RecordingPane::new("m", ["t"]);
        let observer = pane.clone();
        let (status, _) = call(app(Some(pane), None), submit(envelope(None, "t"))).await;
        assert_eq!(status, StatusCode::OK);

        let submitted = observer.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].topic, "t");
        assert_eq!(submitted[0].producer, "remote");
    }

    #[tokio::test]
    async fn auth_gate_missing_wrong_right() {
        let auth: AuthCallback = Arc::new(|request: &SubmitRequest| {
            request.auth.as_ref() == Some(&json!("sekret"))
        });

        let cases = [
            (None, StatusCode::UNAUTHORIZED),
            (Some(json!("wrong")), StatusCode::UNAUTHORIZED),
            (Some(json!("sekret")), StatusCode::OK),
        ];
        for (material, expected) in cases {
            let pane = RecordingPane::new("m", ["t"]);
            let (status, _) = call(
                app(Some(pane), Some(auth.clone())),
                submit(envelope(material, "t")),
            )
            .await;
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn rejected_submission_never_reaches_the_pane() {
        let auth: AuthCallback = Arc::new(|_: &SubmitRequest| false);
        let pane = RecordingPane::new("m", ["t"]);
        let observer = pane.clone();

        let (status, _) = call(
            app(Some(pane), Some(auth)),
            submit(envelope(Some(json!("x")), "t")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(observer.submitted().is_empty());
    }

    #[test]
    fn envelope_null_and_missing_auth_decode_to_none() {
        let with_null: SubmitRequest = serde_json::from_str(
            r#"{ "Auth": null, "Event": { "Spawned": "2026-01-02T03:04:05Z", "Topic": "t", "Producer": "p", "Data": 1 } }"#,
        )
        .unwrap();
        assert!(with_null.auth.is_none());

        let without: SubmitRequest = serde_json::from_str(
            r#"{ "Event": { "Spawned": "2026-01-02T03:04:05Z", "Topic": "t", "Producer": "p", "Data": 1 } }"#,
        )
        .unwrap();
        assert!(without.auth.is_none());
    }
}

//! End-to-end ingress tests: a real engine, a real HTTP server, real
//! clients.

use axon_event::{Consumer, Event, TopicCfg};
use axon_ingress::{client, AuthCallback, Config, Endpoint, PING_RESPONSE};
use axon_runtime::Engine;
use serde_json::json;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    engine: Engine,
    address: String,
    delivered: mpsc::Receiver<Event>,
}

/// Engine + ingress on an ephemeral port, with one consumer watching
/// `topicA` and forwarding deliveries to the test.
fn start_harness(auth: Option<AuthCallback>) -> Harness {
    let mut config = Config::new("127.0.0.1:0").with_graceful_shutdown(Duration::from_secs(2));
    if let Some(auth) = auth {
        config = config.with_auth(auth);
    }
    let endpoint = Endpoint::new(config);
    let bound = endpoint.bound_addr();

    let mut engine = Engine::new();
    engine
        .use_module(Box::new(endpoint), &[TopicCfg::new("topic.http")])
        .unwrap();
    engine.create_topic(&TopicCfg::new("topicA")).unwrap();

    let (delivered_tx, delivered) = mpsc::channel::<Event>();
    engine.register(Consumer::new("watcher", move |event: &Event| {
        let _ = delivered_tx.send(event.clone());
    }));
    engine.subscribe_to("topicA", ["watcher"]).unwrap();

    engine.start().unwrap();
    let address = bound.get().expect("endpoint bound during start").to_string();

    Harness {
        engine,
        address,
        delivered,
    }
}

fn token_auth(token: &'static str) -> AuthCallback {
    Arc::new(move |request| request.auth.as_ref() == Some(&json!(token)))
}

#[tokio::test(flavor = "multi_thread")]
async fn ping_round_trip() {
    let mut harness = start_harness(None);

    let report = client::submit_ping(&harness.address, 3, None).await;
    assert_eq!(report.total, 3);
    assert_eq!(report.failed, 0);

    let body = reqwest::get(format!("http://{}/ping", harness.address))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, PING_RESPONSE);

    harness.engine.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn submit_reaches_subscribed_consumer() {
    let mut harness = start_harness(None);

    let event = Event::new("remote-prod", "topicA", json!({ "reading": 42 }));
    let response = client::submit_event(&harness.address, &event).await.unwrap();
    assert_eq!(response.status, 200);

    let delivered = harness
        .delivered
        .recv_timeout(Duration::from_secs(5))
        .expect("event delivered");
    assert_eq!(delivered, event);

    harness.engine.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn auth_token_gates_submission() {
    let mut harness = start_harness(Some(token_auth("sekret")));
    let event = Event::new("remote-prod", "topicA", json!(1));

    // Right token: accepted and delivered.
    let response = client::submit_event_with_auth(&harness.address, &event, json!("sekret"))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert!(harness
        .delivered
        .recv_timeout(Duration::from_secs(5))
        .is_ok());

    // Wrong token: 401, nothing delivered.
    let response = client::submit_event_with_auth(&harness.address, &event, json!("nope"))
        .await
        .unwrap();
    assert_eq!(response.status, 401);

    // Missing token: 401.
    let response = client::submit_event(&harness.address, &event).await.unwrap();
    assert_eq!(response.status, 401);

    assert!(harness
        .delivered
        .recv_timeout(Duration::from_millis(300))
        .is_err());

    harness.engine.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_topic_and_bad_json_are_400() {
    let mut harness = start_harness(None);

    let event = Event::new("remote-prod", "no-such-topic", json!(1));
    let response = client::submit_event(&harness.address, &event).await.unwrap();
    assert_eq!(response.status, 400);
    assert_eq!(response.body, "unknown topic");

    let raw = reqwest::Client::new()
        .post(format!("http://{}/submit", harness.address))
        .header("content-type", "application/json")
        .body("{definitely not json")
        .send()
        .await
        .unwrap();
    assert_eq!(raw.status().as_u16(), 400);

    harness.engine.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn server_goes_away_after_engine_stop() {
    let mut harness = start_harness(None);
    let address = harness.address.clone();

    assert_eq!(client::submit_ping(&address, 1, None).await.failed, 0);

    harness.engine.stop().unwrap();

    let report = client::submit_ping(&address, 1, None).await;
    assert_eq!(report.failed, 1);
}

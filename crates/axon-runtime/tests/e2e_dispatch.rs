//! End-to-end dispatch scenarios against a real engine.
//!
//! `Engine::stop` drains the intake and joins the worker, so asserting
//! after `stop` needs no sleeps. Mid-sequence assertions use the
//! rendezvous property instead: a follow-up submission only returns
//! once the worker has taken it, which means every earlier event has
//! finished dispatching.

use axon_event::{Consumer, Event, EventHandler, TopicCfg};
use axon_runtime::{Engine, EngineCallbacks};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// (topic, producer, payload) triple as recorded by a consumer.
type Activity = (String, String, Value);

fn recording_consumer(id: &str) -> (Consumer, Arc<Mutex<Vec<Activity>>>) {
    let seen: Arc<Mutex<Vec<Activity>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let consumer = Consumer::new(id, move |event: &Event| {
        sink.lock()
            .push((event.topic.clone(), event.producer.clone(), event.data.clone()));
    });
    (consumer, seen)
}

/// Barrier: returns only after every previously submitted event has
/// been fully dispatched (the worker had to finish them to take this).
fn flush(engine: &Engine) {
    engine
        .submit("flush", "no.such.topic", Value::Null)
        .expect("engine running");
}

fn wait_for(flag: &AtomicBool, deadline: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if flag.load(Ordering::SeqCst) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    flag.load(Ordering::SeqCst)
}

#[test]
fn broadcast_fanout_across_topics_and_consumers() {
    let topics = [
        "/user/bldg-a/floor-0/temp",
        "/user/bldg-a/floor-0/humidity",
        "/user/bldg-a/floor-1/temp",
        "/user/bldg-a/floor-1/humidity",
        "/user/bldg-a/floor-2/temp",
        "/user/bldg-a/floor-2/humidity",
    ];

    let fired: Vec<Arc<AtomicBool>> = (0..4).map(|_| Arc::new(AtomicBool::new(false))).collect();
    fn hook(flag: Arc<AtomicBool>) -> EventHandler {
        Arc::new(move |_: &Event| {
            flag.store(true, Ordering::SeqCst);
        })
    }

    let mut engine = Engine::new().with_callbacks(EngineCallbacks {
        register: Some(hook(fired[0].clone())),
        new_topic: Some(hook(fired[1].clone())),
        consume: Some(hook(fired[2].clone())),
        submit: Some(hook(fired[3].clone())),
    });

    for topic in &topics {
        engine.create_topic(&TopicCfg::new(*topic)).unwrap();
    }

    let mut actors = Vec::new();
    let mut actor_ids = Vec::new();
    for i in 0..25 {
        let id = format!("device.{i}");
        let (consumer, seen) = recording_consumer(&id);
        engine.register(consumer);
        actors.push(seen);
        actor_ids.push(id);
    }

    for topic in &topics {
        engine.subscribe_to(topic, &actor_ids).unwrap();
    }

    engine.start().unwrap();

    let num_sends = 5;
    for topic in &topics {
        for i in 0..num_sends {
            for id in &actor_ids {
                engine.submit(id.clone(), *topic, json!(i)).unwrap();
            }
        }
    }

    engine.stop().unwrap();

    // 750 submissions, all broadcast: every actor sees every event, and
    // each (producer, payload) signature shows up once per topic.
    for seen in &actors {
        let seen = seen.lock();
        assert_eq!(seen.len(), topics.len() * num_sends * actor_ids.len());

        for id in &actor_ids {
            for i in 0..num_sends {
                let occurrences = seen
                    .iter()
                    .filter(|(_, producer, data)| producer == id && *data == json!(i))
                    .count();
                assert_eq!(
                    occurrences,
                    topics.len(),
                    "signature ({id}, {i}) should appear once per topic"
                );
            }
        }
    }

    // Observation hooks fire from detached threads; give stragglers a
    // bounded window.
    for (name, flag) in ["register", "new_topic", "consume", "submit"]
        .iter()
        .zip(&fired)
    {
        assert!(
            wait_for(flag, Duration::from_secs(2)),
            "{name} callback never fired"
        );
    }
}

#[test]
fn round_robin_delivers_in_strict_rotation() {
    let mut engine = Engine::new();
    engine
        .create_topic(&TopicCfg::new("grouped").direct().round_robin())
        .unwrap();

    let mut seen = Vec::new();
    for id in ["B", "C", "D"] {
        let (consumer, record) = recording_consumer(id);
        engine.register(consumer);
        seen.push(record);
    }
    engine.subscribe_to("grouped", ["B", "C", "D"]).unwrap();

    engine.start().unwrap();

    for i in 0..6 {
        engine.submit("A", "grouped", json!(i)).unwrap();
    }
    flush(&engine);

    let payloads = |record: &Arc<Mutex<Vec<Activity>>>| -> Vec<Value> {
        record.lock().iter().map(|(_, _, data)| data.clone()).collect()
    };

    assert_eq!(payloads(&seen[0]), vec![json!(0), json!(3)]);
    assert_eq!(payloads(&seen[1]), vec![json!(1), json!(4)]);
    assert_eq!(payloads(&seen[2]), vec![json!(2), json!(5)]);

    engine.submit("A", "grouped", json!(6)).unwrap();
    engine.submit("A", "grouped", json!(7)).unwrap();
    engine.stop().unwrap();

    assert_eq!(seen[0].lock().len(), 3);
    assert_eq!(seen[1].lock().len(), 3);
    assert_eq!(seen[2].lock().len(), 2);
}

#[test]
fn random_selection_spreads_over_all_subscribers() {
    // Enough events that P(some subscriber gets none) is negligible:
    // 3 * (2/3)^1024 ≈ 10^-180.
    const NUM_EVENTS: usize = 1024;

    let mut engine = Engine::new();
    engine
        .create_topic(&TopicCfg::new("grouped").direct().random())
        .unwrap();

    let mut seen = Vec::new();
    for id in ["B", "C", "D"] {
        let (consumer, record) = recording_consumer(id);
        engine.register(consumer);
        seen.push(record);
    }
    engine.subscribe_to("grouped", ["B", "C", "D"]).unwrap();

    engine.start().unwrap();
    for i in 0..NUM_EVENTS {
        engine.submit("A", "grouped", json!(i)).unwrap();
    }
    engine.stop().unwrap();

    let counts: Vec<usize> = seen.iter().map(|record| record.lock().len()).collect();
    for (idx, count) in counts.iter().enumerate() {
        assert!(*count >= 1, "subscriber {idx} received no events");
    }
    assert_eq!(counts.iter().sum::<usize>(), NUM_EVENTS);
}

#[test]
fn routes_deliver_to_their_own_slots() {
    let mut engine = Engine::new();

    let slots: Arc<Vec<AtomicI64>> = Arc::new((0..10).map(|_| AtomicI64::new(-1)).collect());
    let mut producers = Vec::new();

    for i in 0..10 {
        let slots = slots.clone();
        let producer = engine
            .add_route(format!("/route/{i}"), move |ctx| {
                if let Some(value) = ctx.event.data.as_i64() {
                    slots[i].store(value, Ordering::SeqCst);
                }
            })
            .unwrap();
        producers.push(producer);
    }

    engine.start().unwrap();
    for (i, producer) in producers.iter().enumerate() {
        producer(json!(i as i64)).unwrap();
    }
    engine.stop().unwrap();

    for (i, slot) in slots.iter().enumerate() {
        assert_eq!(slot.load(Ordering::SeqCst), i as i64);
    }
}

#[test]
fn producers_fail_once_engine_stops() {
    let mut engine = Engine::new();
    let producer = engine.add_route("/route/solo", |_| {}).unwrap();

    assert!(producer(json!(1)).is_err(), "engine not started yet");

    engine.start().unwrap();
    assert!(producer(json!(2)).is_ok());

    engine.stop().unwrap();
    assert!(producer(json!(3)).is_err(), "engine stopped");
}

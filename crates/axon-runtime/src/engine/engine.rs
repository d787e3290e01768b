//! The engine: registries, lifecycle, single-writer dispatch.
//!
//! # Dispatch loop
//!
//! ```text
//! submit ──► intake (rendezvous) ──► worker thread
//!                                       │ snapshot topic under lock
//!                                       │ release lock
//!                                       ▼
//!                 Broadcast: thread per live subscriber, join all
//!                 Direct:    one subscriber by selection rule
//! ```
//!
//! One worker drains the intake, which is what makes per-topic ordering
//! trivially correct. Broadcast fan-out waits for every subscriber of
//! the current event before the worker takes the next one: sibling
//! isolation inside a fan-out, a completion barrier between events.
//!
//! # Lifecycle
//!
//! `Created → Running → Stopped`, one way. Modules start after the
//! worker is up and shut down before the intake closes, so module
//! publishes are never lost to a closed channel at either edge.

use super::error::{EngineError, SubscribeError};
use super::pane::EnginePane;
use super::route::Producer;
use super::topic::{Topic, TopicSnapshot};
use axon_event::{Consumer, Context, Distribution, Event, EventHandler, Selection, TopicCfg};
use axon_module::Module;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Reserved topic name carrying the engine's observation events.
pub const INTERNAL_TOPIC: &str = "axon.internal";

/// Producer id stamped on observation events.
const ENGINE_PRODUCER: &str = "axon.engine";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Stopped,
}

/// Optional observation hooks.
///
/// Each hook receives a synthetic event on [`INTERNAL_TOPIC`] from a
/// detached thread, so observers never sit on the dispatch or
/// registration path. The payload identifies what happened: the
/// consumer id for `register`, the serialized [`TopicCfg`] for
/// `new_topic`, `"topic:consumer"` for `consume`, and the submitted
/// event for `submit`.
#[derive(Clone, Default)]
pub struct EngineCallbacks {
    pub register: Option<EventHandler>,
    pub new_topic: Option<EventHandler>,
    pub consume: Option<EventHandler>,
    pub submit: Option<EventHandler>,
}

/// State reachable from panes and route producers.
///
/// The engine owns module boxes and the worker handle; everything the
/// capability surfaces need lives here behind its own lock.
pub(crate) struct Shared {
    topics: Mutex<HashMap<String, Topic>>,
    consumers: Mutex<HashMap<String, EventHandler>>,
    module_meta: Mutex<HashMap<String, Value>>,
    intake: Mutex<Option<SyncSender<Event>>>,
    lifecycle: Mutex<Lifecycle>,
    callbacks: RwLock<EngineCallbacks>,
}

impl Shared {
    pub(crate) fn contains_topic(&self, name: &str) -> bool {
        self.topics.lock().contains_key(name)
    }

    pub(crate) fn contains_consumer(&self, id: &str) -> bool {
        self.consumers.lock().contains_key(id)
    }

    pub(crate) fn create_topic(&self, cfg: &TopicCfg) -> Result<(), EngineError> {
        debug!(name = %cfg.name, distribution = ?cfg.distribution, selection = ?cfg.selection, "create_topic");
        {
            let mut topics = self.topics.lock();
            if topics.contains_key(&cfg.name) {
                return Err(EngineError::DuplicateTopic(cfg.name.clone()));
            }
            topics.insert(cfg.name.clone(), Topic::from_cfg(cfg));
        }
        self.fire_callback(
            |cbs| cbs.new_topic.clone(),
            || serde_json::to_value(cfg).unwrap_or(Value::Null),
        );
        Ok(())
    }

    pub(crate) fn delete_topic(&self, name: &str) {
        debug!(name, "delete_topic");
        self.topics.lock().remove(name);
    }

    pub(crate) fn register(&self, consumer: Consumer) {
        debug!(id = %consumer.id, "register");
        let Consumer { id, handler } = consumer;
        self.consumers.lock().insert(id.clone(), handler);
        self.fire_callback(|cbs| cbs.register.clone(), || Value::String(id));
    }

    /// Appends the currently-registered handler for `id` to the topic.
    ///
    /// Lock order: consumers before topics. Duplicate subscriptions are
    /// not checked for; subscribing the same id twice means two
    /// deliveries per event.
    pub(crate) fn subscribe_one(&self, topic: &str, id: &str) -> Result<(), SubscribeError> {
        {
            let consumers = self.consumers.lock();
            let handler = consumers
                .get(id)
                .cloned()
                .ok_or_else(|| SubscribeError::UnknownConsumer(id.to_string()))?;

            let mut topics = self.topics.lock();
            let entry = topics
                .get_mut(topic)
                .ok_or_else(|| SubscribeError::UnknownTopic(topic.to_string()))?;

            info!(topic, consumer = id, "adding consumer");
            entry.subscribers.push(Some(handler));
        }
        let subscription = format!("{topic}:{id}");
        self.fire_callback(|cbs| cbs.consume.clone(), move || {
            Value::String(subscription)
        });
        Ok(())
    }

    /// Enqueues an event for the dispatch worker.
    ///
    /// Blocks until the worker takes it — the intake is a rendezvous
    /// channel, which is the engine's back-pressure mechanism.
    pub(crate) fn submit_event(&self, event: Event) -> Result<(), EngineError> {
        debug!(topic = %event.topic, producer = %event.producer, "submit");

        let sender = {
            let lifecycle = self.lifecycle.lock();
            if *lifecycle != Lifecycle::Running {
                return Err(EngineError::NotRunning);
            }
            match self.intake.lock().as_ref() {
                Some(sender) => sender.clone(),
                None => return Err(EngineError::NotRunning),
            }
        };

        let submitted = event.clone();
        if sender.send(event).is_err() {
            return Err(EngineError::NotRunning);
        }

        self.fire_callback(
            |cbs| cbs.submit.clone(),
            move || serde_json::to_value(&submitted).unwrap_or(Value::Null),
        );
        Ok(())
    }

    pub(crate) fn module_meta(&self, module: &str) -> Value {
        match self.module_meta.lock().get(module) {
            Some(value) => value.clone(),
            None => {
                warn!(module, "meta requested for unknown module");
                Value::Null
            }
        }
    }

    /// Fires one observation hook on a detached thread. The payload
    /// closure only runs when the hook is actually configured.
    fn fire_callback(
        &self,
        select: impl FnOnce(&EngineCallbacks) -> Option<EventHandler>,
        data: impl FnOnce() -> Value,
    ) {
        let Some(callback) = select(&self.callbacks.read()) else {
            return;
        };
        let payload = data();
        thread::spawn(move || {
            let event = Event::new(ENGINE_PRODUCER, INTERNAL_TOPIC, payload);
            callback(&event);
        });
    }
}

/// The event engine.
///
/// Owns the topic, consumer and module registries, the intake channel
/// and the dispatch worker. Cheap observation (`contains_topic`),
/// registration and submission take `&self`; lifecycle transitions take
/// `&mut self`.
///
/// # Example
///
/// ```
/// use axon_event::{Consumer, TopicCfg};
/// use axon_runtime::Engine;
/// use serde_json::json;
///
/// let mut engine = Engine::new();
/// engine.create_topic(&TopicCfg::new("greetings")).unwrap();
/// engine.register(Consumer::new("printer", |event| {
///     println!("{}", event.data);
/// }));
/// engine.subscribe_to("greetings", ["printer"]).unwrap();
///
/// engine.start().unwrap();
/// engine.submit("demo", "greetings", json!("hello")).unwrap();
/// engine.stop().unwrap();
/// ```
pub struct Engine {
    shared: Arc<Shared>,
    modules: Mutex<HashMap<String, Box<dyn Module>>>,
    worker: Option<JoinHandle<()>>,
}

impl Engine {
    /// A fresh engine in the Created state, with the reserved internal
    /// topic already present.
    #[must_use]
    pub fn new() -> Self {
        let mut topics = HashMap::new();
        topics.insert(
            INTERNAL_TOPIC.to_string(),
            Topic::from_cfg(&TopicCfg::new(INTERNAL_TOPIC)),
        );

        Self {
            shared: Arc::new(Shared {
                topics: Mutex::new(topics),
                consumers: Mutex::new(HashMap::new()),
                module_meta: Mutex::new(HashMap::new()),
                intake: Mutex::new(None),
                lifecycle: Mutex::new(Lifecycle::Created),
                callbacks: RwLock::new(EngineCallbacks::default()),
            }),
            modules: Mutex::new(HashMap::new()),
            worker: None,
        }
    }

    /// Installs observation hooks. Replaces any previous set.
    #[must_use]
    pub fn with_callbacks(self, callbacks: EngineCallbacks) -> Self {
        *self.shared.callbacks.write() = callbacks;
        self
    }

    /// Bulk-creates topics at construction time.
    ///
    /// # Errors
    ///
    /// Returns the first [`EngineError::DuplicateTopic`] encountered;
    /// topics created before the failure remain.
    pub fn with_topics(self, topics: &[TopicCfg]) -> Result<Self, EngineError> {
        for cfg in topics {
            self.shared.create_topic(cfg)?;
        }
        Ok(self)
    }

    /// Whether `name` currently exists in the topic registry.
    #[must_use]
    pub fn contains_topic(&self, name: &str) -> bool {
        self.shared.contains_topic(name)
    }

    /// Whether `id` is currently registered as a consumer.
    #[must_use]
    pub fn contains_consumer(&self, id: &str) -> bool {
        self.shared.contains_consumer(id)
    }

    /// Atomically inserts a new topic.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateTopic`] when the name exists.
    pub fn create_topic(&self, cfg: &TopicCfg) -> Result<(), EngineError> {
        self.shared.create_topic(cfg)
    }

    /// Removes a topic. Idempotent; events already dequeued for the
    /// topic keep delivering to the subscriber list they captured.
    pub fn delete_topic(&self, name: &str) {
        self.shared.delete_topic(name);
    }

    /// Inserts (or replaces) the id → handler mapping.
    ///
    /// Replacement rewires future subscriptions only: a topic that
    /// already subscribed this id keeps the handler it captured.
    pub fn register(&self, consumer: Consumer) {
        self.shared.register(consumer);
    }

    /// Subscribes registered consumer ids to a topic, in order.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownTopic`] or [`EngineError::UnknownConsumer`]
    /// for the first id that fails; earlier subscriptions stand.
    pub fn subscribe_to<I, S>(&self, topic: &str, consumers: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        debug!(topic, "subscribe_to");
        for id in consumers {
            self.shared.subscribe_one(topic, id.as_ref())?;
        }
        Ok(())
    }

    /// Builds an event stamped now and enqueues it.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotRunning`] unless the engine is Running.
    pub fn submit(
        &self,
        producer: impl Into<String>,
        topic: impl Into<String>,
        data: Value,
    ) -> Result<(), EngineError> {
        self.shared.submit_event(Event::new(producer, topic, data))
    }

    /// Enqueues a caller-supplied event verbatim, timestamp included.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotRunning`] unless the engine is Running.
    pub fn submit_event(&self, event: Event) -> Result<(), EngineError> {
        self.shared.submit_event(event)
    }

    /// Binds one consumer function to one fresh Broadcast topic and
    /// returns a producer closure for it.
    ///
    /// The topic gets the default policy (Broadcast + Arbitrary, which
    /// with a single subscriber is indistinguishable from direct
    /// delivery). The internal consumer registers as `route:<topic>`;
    /// the returned producer emits as `prod:<topic>` and is safe to
    /// call from any thread while the engine is Running.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateTopic`] when the route topic exists.
    pub fn add_route(
        &self,
        topic: impl Into<String>,
        route: impl Fn(&Context) + Send + Sync + 'static,
    ) -> Result<Producer, EngineError> {
        let topic = topic.into();
        debug!(topic = %topic, "add_route");

        self.create_topic(&TopicCfg::new(topic.clone()))?;
        self.register(Consumer::new(format!("route:{topic}"), move |event: &Event| {
            route(&Context {
                event: event.clone(),
            });
        }));
        self.subscribe_to(&topic, [format!("route:{topic}")])?;

        let shared = Arc::clone(&self.shared);
        let producer = format!("prod:{topic}");
        Ok(Box::new(move |data: Value| {
            shared.submit_event(Event::new(producer.clone(), topic.clone(), data))
        }))
    }

    /// Registers a module: creates its declared topics (tolerating ones
    /// that already exist), hands it a pane bound to its name, and
    /// records it for lifecycle management.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateModule`] when the name is taken; any
    /// non-duplicate topic creation failure propagates.
    pub fn use_module(
        &self,
        mut module: Box<dyn Module>,
        topics: &[TopicCfg],
    ) -> Result<(), EngineError> {
        let name = module.name().to_string();
        debug!(module = %name, "use_module");

        let mut modules = self.modules.lock();
        if modules.contains_key(&name) {
            return Err(EngineError::DuplicateModule(name));
        }

        for cfg in topics {
            match self.shared.create_topic(cfg) {
                Ok(()) | Err(EngineError::DuplicateTopic(_)) => {}
                Err(err) => return Err(err),
            }
        }

        self.shared
            .module_meta
            .lock()
            .entry(name.clone())
            .or_insert(Value::Null);

        module.attach_pane(Box::new(EnginePane::new(
            name.clone(),
            Arc::clone(&self.shared),
        )));
        modules.insert(name, module);
        Ok(())
    }

    /// Stores a value in a module's meta slot.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownModule`] when no module of that name is
    /// registered.
    pub fn set_module_meta(&self, module: &str, value: Value) -> Result<(), EngineError> {
        match self.shared.module_meta.lock().get_mut(module) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EngineError::UnknownModule(module.to_string())),
        }
    }

    /// Reads a module's meta slot; `Value::Null` (with a warning) when
    /// the module is unknown.
    #[must_use]
    pub fn module_meta(&self, module: &str) -> Value {
        self.shared.module_meta(module)
    }

    /// Transitions Created → Running: spawns the dispatch worker, then
    /// starts every registered module.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyRunning`] unless the engine is freshly
    /// created; [`EngineError::Module`] when a module fails to come up
    /// (the engine stays Running — callers decide whether to stop).
    pub fn start(&mut self) -> Result<(), EngineError> {
        debug!("start");
        {
            let mut lifecycle = self.shared.lifecycle.lock();
            if *lifecycle != Lifecycle::Created {
                return Err(EngineError::AlreadyRunning);
            }
            *lifecycle = Lifecycle::Running;
        }

        let (sender, receiver) = mpsc::sync_channel::<Event>(0);
        *self.shared.intake.lock() = Some(sender);

        let shared = Arc::clone(&self.shared);
        self.worker = Some(thread::spawn(move || {
            for event in receiver {
                if !event.topic.is_empty() {
                    emit(&shared, &event);
                }
            }
            debug!("dispatch worker drained");
        }));

        for (name, module) in self.modules.lock().iter_mut() {
            debug!(module = %name, "indicating start to module");
            module.start().map_err(|source| EngineError::Module {
                name: name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Transitions Running → Stopped: shuts modules down (their final
    /// publishes still land), then closes the intake and waits for the
    /// worker to drain and exit. When this returns, no handler runs
    /// again.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotRunning`] unless the engine is Running.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        debug!("stop");
        if *self.shared.lifecycle.lock() != Lifecycle::Running {
            return Err(EngineError::NotRunning);
        }

        for (name, module) in self.modules.lock().iter_mut() {
            debug!(module = %name, "indicating shutdown to module");
            module.shutdown();
        }

        *self.shared.lifecycle.lock() = Lifecycle::Stopped;
        self.shared.intake.lock().take();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("dispatch worker panicked");
            }
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes one dequeued event. Runs on the dispatch worker.
fn emit(shared: &Shared, event: &Event) {
    debug!(topic = %event.topic, producer = %event.producer, "emit");

    let snapshot = {
        let topics = shared.topics.lock();
        match topics.get(&event.topic) {
            Some(topic) => topic.snapshot(&event.topic),
            None => {
                warn!(topic = %event.topic, "unknown topic");
                return;
            }
        }
    };

    if !snapshot.has_subscriber() {
        debug!(topic = %event.topic, producer = %event.producer, "no consumers for event topic");
        return;
    }

    match snapshot.distribution {
        Distribution::Broadcast => publish_broadcast(event, &snapshot),
        Distribution::Direct => publish_direct(event, &snapshot),
    }
}

/// One thread per live subscriber; returns when all of them finish.
fn publish_broadcast(event: &Event, topic: &TopicSnapshot) {
    thread::scope(|scope| {
        for handler in topic.subscribers.iter().flatten() {
            scope.spawn(move || invoke(handler, event));
        }
    });
}

/// Exactly one delivery, synchronous on the worker.
fn publish_direct(event: &Event, topic: &TopicSnapshot) {
    let selected = match topic.selection {
        Selection::Arbitrary => match topic.subscribers.iter().flatten().next() {
            Some(handler) => {
                invoke(handler, event);
                return;
            }
            None => Err(EngineError::NoSubscriber(topic.name.clone())),
        },
        Selection::RoundRobin => topic.rr_next(),
        Selection::Random => topic.random_subscriber(),
    };

    match selected {
        Ok(idx) => {
            if let Some(handler) = &topic.subscribers[idx] {
                invoke(handler, event);
            }
        }
        Err(err) => debug!(topic = %topic.name, error = %err, "selection found no subscriber"),
    }
}

/// Invokes a handler, containing panics so one bad subscriber cannot
/// abort siblings or subsequent deliveries.
fn invoke(handler: &EventHandler, event: &Event) {
    if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
        error!(topic = %event.topic, producer = %event.producer, "subscriber panicked");
    }
}

//! Time-boxed message collection.
//!
//! A [`MessageCollector`] gathers the messages posted in one channel until
//! either enough have arrived or a deadline passes:
//!
//! ```text
//!              run()                  count reached / end()
//!   Idle ──────────────► Running ─────────────────────────► Ended    → Ok(messages)
//!                           │
//!                           └──────── deadline ───────────► TimedOut → Err(TimedOut)
//! ```
//!
//! While running, the collector registers three gate-bypassing listeners
//! with the [`EventManager`]:
//!
//! - **create**: matching messages are stored, keyed by message id
//! - **update**: a stored message is replaced after a short settling delay,
//!   unless it was removed in the meantime
//! - **delete**: a stored message is removed
//!
//! All three are unregistered before `run` returns, and also if the `run`
//! future is dropped early.

use std::sync::Arc;
use std::time::Duration;

use axon_core::{EventName, KeyedContainer, Message};
use futures::future;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CollectorError, CollectorResult};
use crate::event_manager::EventManager;
use crate::listener::Listener;

/// Delay before an edit replaces the stored message.
pub const UPDATE_SETTLE_DELAY: Duration = Duration::from_millis(500);

const EVENT_BUFFER: usize = 64;

// =============================================================================
// Options
// =============================================================================

/// Default collector options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorOptions {
    /// Deadline in milliseconds.
    pub timeout_ms: u64,
    /// Number of messages that ends the collection.
    pub count: usize,
    /// Skip messages written by bot accounts.
    pub ignore_bots: bool,
    /// When `false`, stored message content is lower-cased.
    pub case_sensitive: bool,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            count: 100,
            ignore_bots: true,
            case_sensitive: true,
        }
    }
}

/// Per-run overrides of [`CollectorOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub timeout: Option<Duration>,
    pub count: Option<usize>,
    pub ignore_bots: Option<bool>,
    pub case_sensitive: Option<bool>,
    /// Only collect messages from this user.
    pub author: Option<String>,
}

impl RunOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn ignore_bots(mut self, ignore: bool) -> Self {
        self.ignore_bots = Some(ignore);
        self
    }

    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

// =============================================================================
// State
// =============================================================================

/// Lifecycle state of a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    Running,
    Ended,
    TimedOut,
}

/// Notifications about the messages of a running collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorEvent {
    Collected(Message),
    Edited(Message),
    Deleted(Message),
}

struct Session {
    state: CollectorState,
    messages: KeyedContainer<Message>,
    /// Present while running; a send wakes `run`.
    end: Option<mpsc::UnboundedSender<()>>,
}

impl Session {
    fn remove_running(&mut self, id: &str) -> Option<Message> {
        if self.state != CollectorState::Running {
            return None;
        }
        self.messages.remove(id)
    }

    /// Moves a running session to `Ended`; later events are ignored even
    /// before `run` unbinds its listeners.
    fn finish(&mut self) {
        self.state = CollectorState::Ended;
        if let Some(end) = &self.end {
            let _ = end.send(());
        }
    }
}

/// What a running collection accepts.
struct Filter {
    channel: String,
    author: Option<String>,
    self_id: Option<String>,
    ignore_bots: bool,
    case_sensitive: bool,
    count: usize,
}

impl Filter {
    fn accepts(&self, message: &Message) -> bool {
        message.channel_id == self.channel
            && self.self_id.as_deref() != Some(message.author.id.as_str())
            && !(self.ignore_bots && message.author.bot)
            && self
                .author
                .as_ref()
                .is_none_or(|author| *author == message.author.id)
    }

    fn normalize(&self, mut message: Message) -> Message {
        if !self.case_sensitive {
            message.content = message.content.to_lowercase();
        }
        message
    }
}

// =============================================================================
// MessageCollector
// =============================================================================

/// Collects the messages of one channel.
///
/// One collector runs one collection at a time; it can be reused once a run
/// has finished.
pub struct MessageCollector {
    events: Arc<EventManager>,
    defaults: CollectorOptions,
    session: Arc<Mutex<Session>>,
    notifications: broadcast::Sender<CollectorEvent>,
}

impl MessageCollector {
    pub fn new(events: Arc<EventManager>, defaults: CollectorOptions) -> Self {
        let (notifications, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            events,
            defaults,
            session: Arc::new(Mutex::new(Session {
                state: CollectorState::Idle,
                messages: KeyedContainer::new(),
                end: None,
            })),
            notifications,
        }
    }

    pub fn defaults(&self) -> &CollectorOptions {
        &self.defaults
    }

    pub fn state(&self) -> CollectorState {
        self.session.lock().state
    }

    /// Number of messages collected so far in the current run.
    pub fn len(&self) -> usize {
        self.session.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to collect / edit / delete notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CollectorEvent> {
        self.notifications.subscribe()
    }

    /// Collects messages posted in `channel`.
    ///
    /// Resolves with the collected messages once the count is reached or
    /// [`end`](Self::end) is called. If the deadline passes first, the
    /// partial collection is discarded and [`CollectorError::TimedOut`] is
    /// returned.
    pub async fn run(
        &self,
        channel: impl Into<String>,
        overrides: RunOptions,
    ) -> CollectorResult<KeyedContainer<Message>> {
        let channel = channel.into();
        let timeout = overrides
            .timeout
            .unwrap_or(Duration::from_millis(self.defaults.timeout_ms));
        let filter = Arc::new(Filter {
            channel: channel.clone(),
            author: overrides.author,
            self_id: self.events.library().self_id(),
            ignore_bots: overrides.ignore_bots.unwrap_or(self.defaults.ignore_bots),
            case_sensitive: overrides
                .case_sensitive
                .unwrap_or(self.defaults.case_sensitive),
            count: overrides.count.unwrap_or(self.defaults.count),
        });

        let (end_tx, mut end_rx) = mpsc::unbounded_channel();
        {
            let mut session = self.session.lock();
            // `end` stays set until the previous run has returned
            if session.state == CollectorState::Running || session.end.is_some() {
                return Err(CollectorError::AlreadyRunning);
            }
            session.state = CollectorState::Running;
            session.messages.clear();
            session.end = Some(end_tx);
        }

        let guard = match self.bind(&filter) {
            Ok(guard) => guard,
            Err(e) => {
                let mut session = self.session.lock();
                session.state = CollectorState::Idle;
                session.end = None;
                return Err(e.into());
            }
        };

        info!(
            collector = %guard.id,
            channel = %channel,
            timeout_ms = timeout.as_millis() as u64,
            count = filter.count,
            "Message collector started"
        );

        let outcome = tokio::select! {
            _ = tokio::time::sleep(timeout) => CollectorState::TimedOut,
            _ = end_rx.recv() => CollectorState::Ended,
        };

        let (outcome, messages) = {
            let mut session = self.session.lock();
            // a count reached in the same instant as the deadline still ends
            if session.state == CollectorState::Running {
                session.state = outcome;
            }
            session.end = None;
            (session.state, std::mem::take(&mut session.messages))
        };
        let id = guard.id;
        drop(guard);
        drop(end_rx);

        match outcome {
            CollectorState::Ended => {
                info!(collector = %id, collected = messages.len(), "Message collector ended");
                Ok(messages)
            }
            _ => {
                info!(collector = %id, discarded = messages.len(), "Message collector timed out");
                Err(CollectorError::TimedOut)
            }
        }
    }

    /// Ends the running collection with what has been collected so far.
    ///
    /// Returns `false` when no collection is running.
    pub fn end(&self) -> bool {
        let mut session = self.session.lock();
        if session.state != CollectorState::Running || session.end.is_none() {
            return false;
        }
        session.finish();
        true
    }

    /// Removes one collected message.
    pub fn delete(&self, id: &str) -> CollectorResult<Message> {
        if !is_snowflake(id) {
            return Err(CollectorError::InvalidId { id: id.to_string() });
        }
        self.session
            .lock()
            .messages
            .remove(id)
            .ok_or_else(|| CollectorError::NotFound { id: id.to_string() })
    }

    fn bind(&self, filter: &Arc<Filter>) -> crate::error::RegistryResult<Bindings> {
        let id = Uuid::new_v4();
        let mut bindings = Bindings {
            id,
            events: Arc::clone(&self.events),
            session: Arc::clone(&self.session),
            labels: Vec::with_capacity(3),
        };

        for listener in [
            self.on_create(format!("collector-{id}-create"), filter),
            self.on_update(format!("collector-{id}-update"), filter),
            self.on_delete(format!("collector-{id}-delete"), filter),
        ] {
            let (event, label) = (listener.event(), listener.label().to_string());
            // On error the guard drops and unbinds what was registered so far.
            self.events.register_listener(Arc::new(listener))?;
            bindings.labels.push((event, label));
        }
        Ok(bindings)
    }

    fn on_create(&self, label: String, filter: &Arc<Filter>) -> Listener {
        let library = Arc::clone(self.events.library());
        let session = Arc::clone(&self.session);
        let notifications = self.notifications.clone();
        let filter = Arc::clone(filter);

        Listener::new(label, EventName::MessageCreate, move |ctx| {
            if let Some(message) = library.message(ctx.event, &ctx.payload)
                && filter.accepts(&message)
            {
                let message = filter.normalize(message);
                let mut session = session.lock();
                if session.state == CollectorState::Running
                    && session.messages.len() < filter.count
                    && session.messages.add(message.id.clone(), message.clone()).is_ok()
                {
                    let _ = notifications.send(CollectorEvent::Collected(message));
                    if session.messages.len() >= filter.count {
                        session.finish();
                    }
                }
            }
            future::ready(Ok(()))
        })
        .bypass_gate(true)
    }

    fn on_update(&self, label: String, filter: &Arc<Filter>) -> Listener {
        let library = Arc::clone(self.events.library());
        let session = Arc::clone(&self.session);
        let notifications = self.notifications.clone();
        let filter = Arc::clone(filter);

        Listener::new(label, EventName::MessageUpdate, move |ctx| {
            let edit = library
                .message_edit(&ctx.payload)
                .filter(|edit| session.lock().messages.has(&edit.id));
            let session = Arc::clone(&session);
            let notifications = notifications.clone();
            let filter = Arc::clone(&filter);

            async move {
                let Some(edit) = edit else {
                    return Ok(());
                };
                tokio::time::sleep(UPDATE_SETTLE_DELAY).await;

                let mut guard = session.lock();
                let stored = match guard.messages.get(&edit.id) {
                    Some(stored) if guard.state == CollectorState::Running => stored,
                    _ => {
                        debug!(message = %edit.id, "Edited message no longer collected, update dropped");
                        return Ok(());
                    }
                };
                let message = filter.normalize(edit.apply(stored));
                guard.messages.update(&message.id, message.clone());
                drop(guard);

                let _ = notifications.send(CollectorEvent::Edited(message));
                Ok(())
            }
        })
        .bypass_gate(true)
    }

    fn on_delete(&self, label: String, filter: &Arc<Filter>) -> Listener {
        let library = Arc::clone(self.events.library());
        let session = Arc::clone(&self.session);
        let notifications = self.notifications.clone();
        let filter = Arc::clone(filter);

        Listener::new(label, EventName::MessageDelete, move |ctx| {
            if let Some(message) = library.message(ctx.event, &ctx.payload)
                && message.channel_id == filter.channel
                && let Some(removed) = session.lock().remove_running(&message.id)
            {
                let _ = notifications.send(CollectorEvent::Deleted(removed));
            }
            future::ready(Ok(()))
        })
        .bypass_gate(true)
    }
}

/// Listeners registered for one run; unregistered on drop.
struct Bindings {
    id: Uuid,
    events: Arc<EventManager>,
    session: Arc<Mutex<Session>>,
    labels: Vec<(EventName, String)>,
}

impl Drop for Bindings {
    fn drop(&mut self) {
        for (event, label) in self.labels.drain(..) {
            if !self.events.unregister_listener(event, &label) {
                warn!(collector = %self.id, listener = %label, "Collector listener already gone");
            }
        }

        let mut session = self.session.lock();
        if session.state == CollectorState::Running {
            // run() was cancelled before reaching a terminal state
            session.state = CollectorState::Ended;
            session.end = None;
            session.messages.clear();
        }
    }
}

/// Platform ids are 17 to 20 digit snowflakes.
fn is_snowflake(id: &str) -> bool {
    (17..=20).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit())
}

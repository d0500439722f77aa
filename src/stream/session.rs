//! Streaming session lifecycle management.
//!
//! One session per open client event stream. The session owns two timers: a
//! periodic heartbeat for liveness and a one-shot close timer scheduled at
//! credential expiry, followed by a jittered grace window and forced
//! transport termination. Disconnecting cancels both timers exactly once.

use crate::core::config::StreamSettings;
use crate::core::time::Clock;
use crate::stream::authorize::AuthorizationOutcome;
use crate::stream::topic::ScopeMetadata;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// The authenticated caller of a stream request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub groups: Vec<String>,
    /// Opaque continuation token echoed in every pushed payload.
    pub rti: String,
    /// Wall-clock time at which the caller's credential expires.
    pub expires_at: SystemTime,
}

impl Principal {
    pub fn new(id: impl Into<String>, groups: Vec<String>, rti: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            groups,
            rti: rti.into(),
            expires_at: SystemTime::now(),
        }
    }

    pub fn expiring_in(mut self, lifetime: Duration) -> Self {
        self.expires_at = SystemTime::now() + lifetime;
        self
    }

    /// Remaining credential lifetime, clamped at zero.
    pub fn remaining_lifetime(&self) -> Duration {
        self.expires_at
            .duration_since(SystemTime::now())
            .unwrap_or_default()
    }
}

/// Interest and scope a session adopts once its topics are authorized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    /// Event names the session wants, e.g. `shoots`, `issues`, `comments`.
    pub events: BTreeSet<String>,
    /// Merged scope metadata from all authorized topics.
    pub scope: ScopeMetadata,
}

/// Error pushing to a transport whose peer is gone.
#[derive(Debug, Error)]
#[error("event sink closed")]
pub struct SinkClosed;

/// The server-push side of one client transport.
///
/// Push is synchronous and non-blocking; an error means the transport is
/// unusable and the session should be torn down.
pub trait EventSink: Send + Sync + 'static {
    fn push(&self, event: &str, data: Option<Value>) -> Result<(), SinkClosed>;
    /// Advertise the client reconnect delay on the transport.
    fn set_retry(&self, delay: Duration);
    /// Force-terminate the underlying response stream.
    fn terminate(&self);
}

/// Transport lifecycle signals handed to [`open_session`] by the HTTP layer.
pub struct SessionTransport {
    pub sink: Arc<dyn EventSink>,
    /// Resolves once the transport reports the stream established.
    pub connected: oneshot::Receiver<()>,
    /// Flips to true when the client or network tears the transport down.
    pub disconnected: watch::Receiver<bool>,
}

/// One live client event stream. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: Uuid,
    principal: Principal,
    sink: Arc<dyn EventSink>,
    subscription: OnceLock<Subscription>,
    reconnect_hint: Duration,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    shutdown: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn principal(&self) -> &Principal {
        &self.inner.principal
    }

    /// Suggested client reconnect delay, jittered per session.
    pub fn reconnect_hint(&self) -> Duration {
        self.inner.reconnect_hint
    }

    /// Adopt interest and scope, once, after all authorization outcomes
    /// settled. Returns false if the session was already finalized; the
    /// original subscription stays in place.
    pub fn finalize(&self, subscription: Subscription) -> bool {
        self.inner.subscription.set(subscription).is_ok()
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.inner.subscription.get()
    }

    pub fn interested_in(&self, event_name: &str) -> bool {
        self.subscription()
            .map(|sub| sub.events.contains(event_name))
            .unwrap_or(false)
    }

    pub fn scope(&self) -> Option<&ScopeMetadata> {
        self.subscription().map(|sub| &sub.scope)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Push one named event, enveloped with the continuation token and the
    /// floored remaining credential lifetime.
    pub fn push(&self, event: &str, data: Value) -> Result<(), SinkClosed> {
        if self.is_closed() {
            return Err(SinkClosed);
        }
        self.inner.sink.push(event, Some(self.envelope(data)))
    }

    fn envelope(&self, data: Value) -> Value {
        let mut fields = match data {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                let mut fields = Map::new();
                fields.insert("data".to_string(), other);
                fields
            }
        };
        fields.insert("rti".to_string(), json!(self.inner.principal.rti));
        fields.insert(
            "expiresIn".to_string(),
            json!(self.inner.principal.remaining_lifetime().as_secs()),
        );
        Value::Object(fields)
    }

    /// Tear the session down: cancel the heartbeat and close-grace timers.
    /// Reentrant-safe; the second and later calls are no-ops.
    pub fn disconnect(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.inner.heartbeat.lock().take() {
            handle.abort();
        }
        if let Some(handle) = self.inner.shutdown.lock().take() {
            handle.abort();
        }
    }

    /// Store a timer handle, aborting it immediately if the session already
    /// disconnected while the timer was being set up.
    fn store_timer(&self, slot: &Mutex<Option<JoinHandle<()>>>, handle: JoinHandle<()>) {
        let mut guard = slot.lock();
        if self.is_closed() {
            handle.abort();
        } else {
            *guard = Some(handle);
        }
    }
}

/// Open a streaming session. Suspends until the transport reports connected,
/// then pushes the `ready` handshake event carrying 200 or the first
/// rejection's status, and schedules the expiry-driven close.
pub async fn open_session<C: Clock>(
    principal: Principal,
    outcomes: &[AuthorizationOutcome],
    transport: SessionTransport,
    settings: &StreamSettings,
    clock: C,
) -> Session {
    let (status, message) = handshake_status(outcomes);
    let grace = jittered(
        settings.shutdown_grace_base_ms,
        settings.shutdown_grace_jitter_ms,
    );
    let reconnect_hint = jittered(settings.reconnect_base_ms, settings.reconnect_jitter_ms);

    let SessionTransport {
        sink,
        connected,
        disconnected,
    } = transport;

    let session = Session {
        inner: Arc::new(SessionInner {
            id: Uuid::new_v4(),
            principal,
            sink,
            subscription: OnceLock::new(),
            reconnect_hint,
            heartbeat: Mutex::new(None),
            shutdown: Mutex::new(None),
            closed: AtomicBool::new(false),
        }),
    };
    session.inner.sink.set_retry(reconnect_hint);

    start_heartbeat(&session, settings.heartbeat_interval_ms, clock.clone());
    watch_disconnect(&session, disconnected);

    // Suspend until the transport is established. A dropped sender means the
    // transport died before connecting; tear down immediately.
    if connected.await.is_err() {
        session.disconnect();
        return session;
    }

    let mut ready = Map::new();
    ready.insert("ok".to_string(), json!(status == 200));
    ready.insert("statusCode".to_string(), json!(status));
    if let Some(message) = message {
        ready.insert("message".to_string(), json!(message));
    }
    if session.push("ready", Value::Object(ready)).is_err() {
        session.disconnect();
        return session;
    }

    schedule_close(&session, grace, clock);
    session
}

/// 200 unless any outcome is a rejection; then the first rejection's status
/// and message. Later rejections are dropped from the handshake payload but
/// still withhold their channel registrations.
fn handshake_status(outcomes: &[AuthorizationOutcome]) -> (u16, Option<String>) {
    outcomes
        .iter()
        .find_map(|outcome| outcome.rejection())
        .map(|(status, message)| (status, Some(message.to_string())))
        .unwrap_or((200, None))
}

fn start_heartbeat<C: Clock>(session: &Session, interval_ms: u64, clock: C) {
    let interval = Duration::from_millis(interval_ms);
    let handle = tokio::spawn({
        let session = session.clone();
        async move {
            loop {
                clock.sleep(interval).await;
                let now = DateTime::<Utc>::from(clock.now_wall());
                let beat = json!({
                    "time": now.to_rfc3339_opts(SecondsFormat::Millis, true),
                });
                if session.push("heartbeat", beat).is_err() {
                    session.disconnect();
                    break;
                }
            }
        }
    });
    session.store_timer(&session.inner.heartbeat, handle);
}

/// Schedule the close signal at credential expiry. Clients that ignore the
/// signal get the transport terminated after the grace window.
fn schedule_close<C: Clock>(session: &Session, grace: Duration, clock: C) {
    let expires_in = session.principal().remaining_lifetime();
    let handle = tokio::spawn({
        let session = session.clone();
        async move {
            clock.sleep(expires_in).await;
            let _ = session.inner.sink.push("close", None);
            clock.sleep(grace).await;
            session.inner.sink.terminate();
        }
    });
    session.store_timer(&session.inner.shutdown, handle);
}

fn watch_disconnect(session: &Session, mut disconnected: watch::Receiver<bool>) {
    tokio::spawn({
        let session = session.clone();
        async move {
            loop {
                if *disconnected.borrow() {
                    break;
                }
                // A dropped sender means the transport itself is gone.
                if disconnected.changed().await.is_err() {
                    break;
                }
            }
            session.disconnect();
        }
    });
}

fn jittered(base_ms: u64, jitter_ms: u64) -> Duration {
    let jitter = if jitter_ms > 0 {
        rand::thread_rng().gen_range(0..jitter_ms)
    } else {
        0
    };
    Duration::from_millis(base_ms + jitter)
}

//! Ticket bridge integration tests: events from the external source reach
//! exactly the sessions whose authorized scope matches.

mod common;

use beacon::core::time::SystemClock;
use beacon::stream::channels::ChannelHub;
use beacon::stream::handler::handle_event_stream;
use beacon::tickets::bridge::{TicketBridge, TicketEvent, TicketEventKind, TicketSource};
use beacon::tickets::error::SourceError;
use beacon::tickets::retry::RetryPolicy;
use common::{principal, quiet_settings, transport, StubAccess, StubCache, TransportHarness};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct ScriptedSource {
    reload_calls: AtomicU32,
    transient_failures: AtomicU32,
    numbers: Mutex<Vec<u64>>,
}

impl TicketSource for ScriptedSource {
    async fn load_open_issues(&self) -> Result<(), SourceError> {
        self.reload_calls.fetch_add(1, Ordering::SeqCst);
        if self.transient_failures.load(Ordering::SeqCst) > 0 {
            self.transient_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(SourceError::status(502, "bad gateway"));
        }
        Ok(())
    }

    async fn load_issue_comments(&self, _number: u64) -> Result<(), SourceError> {
        Ok(())
    }

    fn issue_numbers(&self) -> Vec<u64> {
        self.numbers.lock().clone()
    }
}

async fn subscribed_session(
    hub: &ChannelHub,
    topics: &[&str],
    access: &StubAccess,
    cache: &StubCache,
) -> (beacon::stream::session::Session, TransportHarness) {
    let raw: Vec<String> = topics.iter().map(|t| (*t).to_string()).collect();
    let (transport, mut harness) = transport();
    let settings = quiet_settings();
    let open = handle_event_stream(
        principal("rti-1"),
        &raw,
        transport,
        hub,
        access,
        cache,
        &settings,
        SystemClock,
    );
    let (spent_tx, _spent_rx) = tokio::sync::oneshot::channel();
    std::mem::replace(&mut harness.connect, spent_tx)
        .send(())
        .unwrap();
    let session = open.await.unwrap();
    (session, harness)
}

#[tokio::test(start_paused = true)]
async fn issue_events_reach_sessions_whose_scope_covers_the_project() {
    let hub = Arc::new(ChannelHub::new());
    let access = StubAccess::allowing_list(&["garden-dev"]);
    let cache = StubCache::with_projects(&[("dev", "garden-dev")]);
    let (session, harness) = subscribed_session(&hub, &["shoots;garden-dev"], &access, &cache).await;

    let bridge = TicketBridge::new(hub.clone(), Arc::new(ScriptedSource::default()), SystemClock);
    bridge.forward(&TicketEvent {
        kind: TicketEventKind::Issue,
        project_name: "dev".to_string(),
        name: None,
        object: json!({"object": {"metadata": {"projectName": "dev", "number": 42}}}),
    });
    bridge.forward(&TicketEvent {
        kind: TicketEventKind::Issue,
        project_name: "prod".to_string(),
        name: None,
        object: json!({"object": {"metadata": {"projectName": "prod", "number": 43}}}),
    });

    assert_eq!(harness.sink.count_of("issues"), 1);
    let issue = harness.sink.payload_for("issues").unwrap();
    assert_eq!(issue["object"]["metadata"]["number"], json!(42));
    session.disconnect();
}

#[tokio::test(start_paused = true)]
async fn comment_events_require_the_named_shoot() {
    let hub = Arc::new(ChannelHub::new());
    let access = StubAccess::allowing_get(&["garden-dev/my-shoot"]);
    let cache = StubCache::with_projects(&[("dev", "garden-dev")]);
    let (named, named_harness) =
        subscribed_session(&hub, &["shoots;garden-dev/my-shoot"], &access, &cache).await;

    let list_access = StubAccess::allowing_list(&["garden-dev"]);
    let (listing, listing_harness) =
        subscribed_session(&hub, &["shoots;garden-dev"], &list_access, &cache).await;

    let bridge = TicketBridge::new(hub.clone(), Arc::new(ScriptedSource::default()), SystemClock);
    bridge.forward(&TicketEvent {
        kind: TicketEventKind::Comment,
        project_name: "dev".to_string(),
        name: Some("my-shoot".to_string()),
        object: json!({"object": {"body": "comment body"}}),
    });

    // Only the session subscribed to the specific shoot gets comments; the
    // namespace-wide session never declared comment interest.
    assert_eq!(named_harness.sink.count_of("comments"), 1);
    assert_eq!(listing_harness.sink.count_of("comments"), 0);
    named.disconnect();
    listing.disconnect();
}

#[tokio::test(start_paused = true)]
async fn startup_reload_retries_transient_failures() {
    let hub = Arc::new(ChannelHub::new());
    let source = Arc::new(ScriptedSource {
        transient_failures: AtomicU32::new(2),
        ..Default::default()
    });
    let bridge = TicketBridge::new(hub, source.clone(), SystemClock).with_retry(RetryPolicy {
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(100),
    });

    bridge.run().await;
    assert_eq!(source.reload_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn recurring_poll_keeps_ticking() {
    let hub = Arc::new(ChannelHub::new());
    let source = Arc::new(ScriptedSource::default());
    source.numbers.lock().extend([1, 2]);
    let bridge = Arc::new(
        TicketBridge::new(hub, source.clone(), SystemClock)
            .with_poll_interval(Some(Duration::from_secs(30))),
    );
    tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.run().await }
    });

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(source.reload_calls.load(Ordering::SeqCst), 3);
}

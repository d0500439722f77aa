//! Common test harness utilities for integration tests.
//!
//! This module provides helpers for:
//! - A recording event sink standing in for the client transport
//! - Transport handles for driving connect/disconnect from tests
//! - Stub permission-engine and project-cache collaborators
//!
//! All helpers use only the public crate API and existing dev-dependencies.

// Not all test files use all helpers; silence dead_code warnings for unused exports.
#![allow(dead_code)]

use beacon::core::config::StreamSettings;
use beacon::stream::authorize::{AccessReview, ProjectCache};
use beacon::stream::error::AccessError;
use beacon::stream::session::{EventSink, Principal, SessionTransport, SinkClosed};
use beacon::stream::topic::ProjectRef;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

/// Event sink that records every push for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pushed: Mutex<Vec<(String, Option<Value>)>>,
    retry: Mutex<Option<Duration>>,
    pub fail: AtomicBool,
    pub terminated: AtomicBool,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<String> {
        self.pushed.lock().iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn payload_for(&self, event: &str) -> Option<Value> {
        self.pushed
            .lock()
            .iter()
            .find(|(e, _)| e == event)
            .and_then(|(_, data)| data.clone())
    }

    pub fn count_of(&self, event: &str) -> usize {
        self.pushed.lock().iter().filter(|(e, _)| e == event).count()
    }

    pub fn retry_hint(&self) -> Option<Duration> {
        *self.retry.lock()
    }
}

impl EventSink for RecordingSink {
    fn push(&self, event: &str, data: Option<Value>) -> Result<(), SinkClosed> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkClosed);
        }
        self.pushed.lock().push((event.to_string(), data));
        Ok(())
    }

    fn set_retry(&self, delay: Duration) {
        *self.retry.lock() = Some(delay);
    }

    fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

/// Handles for driving one transport from a test.
pub struct TransportHarness {
    pub sink: Arc<RecordingSink>,
    pub connect: oneshot::Sender<()>,
    pub disconnect: watch::Sender<bool>,
}

/// Build a transport plus the handles a test drives it with.
pub fn transport() -> (SessionTransport, TransportHarness) {
    let sink = Arc::new(RecordingSink::default());
    let (connect_tx, connect_rx) = oneshot::channel();
    let (disconnect_tx, disconnect_rx) = watch::channel(false);
    let transport = SessionTransport {
        sink: sink.clone(),
        connected: connect_rx,
        disconnected: disconnect_rx,
    };
    let harness = TransportHarness {
        sink,
        connect: connect_tx,
        disconnect: disconnect_tx,
    };
    (transport, harness)
}

/// Stream settings with deterministic (jitter-free) timers.
pub fn quiet_settings() -> StreamSettings {
    StreamSettings {
        heartbeat_interval_ms: 15_000,
        shutdown_grace_base_ms: 2_000,
        shutdown_grace_jitter_ms: 0,
        reconnect_base_ms: 1_000,
        reconnect_jitter_ms: 0,
    }
}

pub fn principal(rti: &str) -> Principal {
    Principal::new("alice", vec!["devs".to_string()], rti)
        .expiring_in(Duration::from_secs(3600))
}

/// Permission engine stub driven by explicit allow-lists.
#[derive(Default)]
pub struct StubAccess {
    pub admin: bool,
    /// Namespaces where listing is allowed.
    pub list_namespaces: BTreeSet<String>,
    /// `namespace/name` pairs where reading a single resource is allowed.
    pub get_resources: BTreeSet<String>,
}

impl StubAccess {
    pub fn allowing_list(namespaces: &[&str]) -> Self {
        Self {
            list_namespaces: namespaces.iter().map(|ns| (*ns).to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn allowing_get(resources: &[&str]) -> Self {
        Self {
            get_resources: resources.iter().map(|r| (*r).to_string()).collect(),
            ..Default::default()
        }
    }
}

impl AccessReview for StubAccess {
    async fn can_list_shoots(
        &self,
        _principal: &Principal,
        namespace: &str,
    ) -> Result<bool, AccessError> {
        Ok(self.list_namespaces.contains(namespace))
    }

    async fn can_get_shoot(
        &self,
        _principal: &Principal,
        namespace: &str,
        name: &str,
    ) -> Result<bool, AccessError> {
        Ok(self.get_resources.contains(&format!("{namespace}/{name}")))
    }

    async fn is_admin(&self, _principal: &Principal) -> Result<bool, AccessError> {
        Ok(self.admin)
    }
}

/// Project cache stub over a fixed project list.
pub struct StubCache {
    pub projects: Vec<ProjectRef>,
}

impl StubCache {
    pub fn with_projects(pairs: &[(&str, &str)]) -> Self {
        Self {
            projects: pairs
                .iter()
                .map(|(name, namespace)| ProjectRef {
                    name: (*name).to_string(),
                    namespace: (*namespace).to_string(),
                })
                .collect(),
        }
    }
}

impl ProjectCache for StubCache {
    fn project_by_namespace(&self, namespace: &str) -> Option<ProjectRef> {
        self.projects
            .iter()
            .find(|p| p.namespace == namespace)
            .cloned()
    }

    fn visible_projects(&self, _principal: &Principal) -> Vec<ProjectRef> {
        self.projects.clone()
    }
}

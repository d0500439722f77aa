//! Poll-to-publish bridge for the external ticket source.
//!
//! Two composed concerns: re-emitting issue/comment deltas from the ticket
//! cache onto the `tickets` channel with scope-matching filters, and a
//! resilient refresh loop that reloads open issues under retry and refetches
//! comments per tracked issue. Source failures never reach a session and
//! never crash the process; the next tick simply tries again.

use crate::core::time::Clock;
use crate::stream::channels::{ChannelHub, ChannelKey};
use crate::tickets::error::SourceError;
use crate::tickets::retry::{retry_transient, RetryPolicy};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// External ticket tracker collaborator. Load calls refresh the underlying
/// cache, which re-emits deltas as [`TicketEvent`]s.
pub trait TicketSource: Send + Sync {
    fn load_open_issues(&self) -> impl Future<Output = Result<(), SourceError>> + Send;

    fn load_issue_comments(
        &self,
        number: u64,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Issue numbers currently tracked by the cache.
    fn issue_numbers(&self) -> Vec<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketEventKind {
    Issue,
    Comment,
}

/// One fetched issue or comment delta; exists only for the duration of one
/// broadcast call.
#[derive(Debug, Clone)]
pub struct TicketEvent {
    pub kind: TicketEventKind,
    pub project_name: String,
    /// Parent resource name; present on comment events.
    pub name: Option<String>,
    /// Payload pushed to matching sessions.
    pub object: Value,
}

/// Bridges the ticket source into the channel fabric.
pub struct TicketBridge<S, C> {
    hub: Arc<ChannelHub>,
    source: Arc<S>,
    clock: C,
    poll_interval: Option<Duration>,
    retry: RetryPolicy,
}

impl<S, C> TicketBridge<S, C>
where
    S: TicketSource,
    C: Clock,
{
    pub fn new(hub: Arc<ChannelHub>, source: Arc<S>, clock: C) -> Self {
        Self {
            hub,
            source,
            clock,
            poll_interval: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Re-emit one cache delta on the `tickets` channel.
    ///
    /// Issue events match sessions whose scope covers the event's project;
    /// comment events require the exact project and parent resource name.
    pub fn forward(&self, event: &TicketEvent) {
        let channel = self.hub.channel(ChannelKey::Tickets);
        match event.kind {
            TicketEventKind::Issue => {
                channel.broadcast(&event.object, "issues", |session| {
                    session
                        .scope()
                        .map(|scope| scope.covers_project(&event.project_name))
                        .unwrap_or(false)
                });
            }
            TicketEventKind::Comment => {
                channel.broadcast(&event.object, "comments", |session| {
                    session
                        .scope()
                        .map(|scope| {
                            scope.project_name.as_deref() == Some(event.project_name.as_str())
                                && scope.name == event.name
                                && event.name.is_some()
                        })
                        .unwrap_or(false)
                });
            }
        }
    }

    /// Drain cache deltas and forward each until the sender side closes.
    pub async fn pump_events(&self, mut events: mpsc::UnboundedReceiver<TicketEvent>) {
        while let Some(event) = events.recv().await {
            self.forward(&event);
        }
    }

    /// Full reload of open issues under unbounded transient retry.
    /// Exhaustion is a log entry, not a crash; returns whether it succeeded.
    pub async fn reload_open_issues(&self) -> bool {
        let source = self.source.clone();
        let result = retry_transient(&self.clock, &self.retry, move || {
            let source = source.clone();
            async move { source.load_open_issues().await }
        })
        .await;
        match result {
            Ok(()) => {
                tracing::info!("successfully fetched tickets");
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch tickets");
                false
            }
        }
    }

    /// One poll tick: reload issues, then refetch comments for every tracked
    /// issue. Each per-issue failure is logged and isolated; the remaining
    /// issue numbers and the overall loop continue.
    pub async fn refresh(&self) {
        self.reload_open_issues().await;
        for number in self.source.issue_numbers() {
            if let Err(err) = self.source.load_issue_comments(number).await {
                tracing::error!(issue = number, error = %err, "failed to fetch comments for issue");
            }
        }
    }

    /// Drive the refresh schedule. Without a poll interval the full reload
    /// runs exactly once at startup and no recurring timer is scheduled.
    pub async fn run(&self) {
        match self.poll_interval {
            None => {
                self.reload_open_issues().await;
            }
            Some(interval) => loop {
                self.clock.sleep(interval).await;
                self.refresh().await;
            },
        }
    }
}

//! Named, process-wide broadcast channels.
//!
//! The fixed channel set is created once at startup and injected into both
//! the session handler and the ticket bridge; there is no hidden global.
//! Broadcasters supply the filter predicate per call, so one channel serves
//! multiple event kinds with different scope-matching rules.

use crate::stream::session::Session;
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

/// The fixed channel topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKey {
    Shoots,
    UnhealthyShoots,
    Tickets,
}

impl ChannelKey {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shoots => "shoots",
            Self::UnhealthyShoots => "unhealthyShoots",
            Self::Tickets => "tickets",
        }
    }
}

/// One named broadcast bus tracking its registered sessions.
pub struct Channel {
    name: &'static str,
    sessions: Mutex<Vec<Session>>,
}

impl Channel {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add a session to the channel. Re-registering is a no-op.
    pub fn register(&self, session: &Session) {
        let mut sessions = self.sessions.lock();
        if sessions.iter().any(|s| s.id() == session.id()) {
            return;
        }
        sessions.push(session.clone());
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Deliver `event` tagged `event_name` to every registered session that
    /// declares interest in the event name and passes the filter.
    ///
    /// A push failure on one session never aborts delivery to the rest; the
    /// failed session is evicted and its disconnect path triggered.
    pub fn broadcast<F>(&self, event: &Value, event_name: &str, filter: F)
    where
        F: Fn(&Session) -> bool,
    {
        // Snapshot under the lock so a mid-broadcast disconnect cannot
        // invalidate the iteration.
        let recipients: Vec<Session> = self.sessions.lock().clone();
        let mut evicted: Vec<Uuid> = Vec::new();
        for session in &recipients {
            if !session.interested_in(event_name) {
                continue;
            }
            if !filter(session) {
                continue;
            }
            if session.push(event_name, event.clone()).is_err() {
                tracing::info!(
                    channel = self.name,
                    session = %session.id(),
                    "push failed during broadcast; evicting session"
                );
                session.disconnect();
                evicted.push(session.id());
            }
        }
        if !evicted.is_empty() {
            self.sessions
                .lock()
                .retain(|s| !evicted.contains(&s.id()));
        }
    }
}

/// Registry owning the fixed channel set for the process lifetime.
pub struct ChannelHub {
    shoots: Channel,
    unhealthy_shoots: Channel,
    tickets: Channel,
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelHub {
    pub fn new() -> Self {
        Self {
            shoots: Channel::new(ChannelKey::Shoots.name()),
            unhealthy_shoots: Channel::new(ChannelKey::UnhealthyShoots.name()),
            tickets: Channel::new(ChannelKey::Tickets.name()),
        }
    }

    pub fn channel(&self, key: ChannelKey) -> &Channel {
        match key {
            ChannelKey::Shoots => &self.shoots,
            ChannelKey::UnhealthyShoots => &self.unhealthy_shoots,
            ChannelKey::Tickets => &self.tickets,
        }
    }
}

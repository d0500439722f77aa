use std::time::{Duration, SystemTime};

/// Clock abstraction to enforce deterministic time sourcing in core paths.
///
/// Session timers and the ticket poll loop sleep through this trait, and the
/// heartbeat reads wall-clock time through it, so tests can drive them on a
/// paused tokio clock with a pinned timestamp.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now_wall(&self) -> SystemTime;
    fn sleep(&self, duration: Duration) -> tokio::time::Sleep;
}

/// System-backed clock; replaceable in tests or deterministic replay.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_wall(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) -> tokio::time::Sleep {
        tokio::time::sleep(duration)
    }
}

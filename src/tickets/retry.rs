//! Retry policy for the ticket source.
//!
//! Transient failures are retried without an attempt bound under capped
//! exponential backoff; anything else aborts immediately. The transient
//! classification is a policy table kept as a pure predicate so it is
//! independently testable and swappable.

use crate::core::time::Clock;
use crate::tickets::error::SourceError;
use std::future::Future;
use std::time::Duration;

/// Status codes the source emits for conditions worth retrying.
pub const TRANSIENT_STATUS_CODES: [u16; 7] = [500, 502, 503, 504, 521, 522, 524];

/// True if the error is worth another attempt.
pub fn is_transient(err: &SourceError) -> bool {
    err.status
        .map(|status| TRANSIENT_STATUS_CODES.contains(&status))
        .unwrap_or(false)
}

/// Backoff shape for [`retry_transient`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Run `op` until it succeeds or fails permanently.
///
/// Transient failures back off exponentially up to the policy cap and retry
/// forever; the first non-transient failure is returned as-is.
pub async fn retry_transient<C, F, Fut>(
    clock: &C,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<(), SourceError>
where
    C: Clock,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), SourceError>>,
{
    let mut backoff = policy.initial_backoff;
    let mut attempt: u64 = 1;
    loop {
        match op().await {
            Ok(()) => return Ok(()),
            Err(err) if is_transient(&err) => {
                tracing::info!(attempt, error = %err, "attempt failed; will retry ticket fetch");
                clock.sleep(backoff).await;
                backoff = (backoff * 2).min(policy.max_backoff);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

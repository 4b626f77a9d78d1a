//! Generic bounded retry with jittered exponential backoff.
//!
//! Shared by page navigation and the single collaborator re-invocation so the
//! backoff policy lives in one place.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Retry policy: `max_attempts` total tries, delays of
/// `base_delay * 2^attempt` plus up to 25% jitter between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1 << attempt.min(6));
        let jitter = rand::thread_rng().gen_range(0.0..0.25);
        exp.mul_f64(1.0 + jitter)
    }
}

/// Run `op` until it succeeds or the policy is exhausted, returning the last
/// error if every attempt fails.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(err);
                }
                let delay = policy.backoff(attempt - 1);
                debug!(%label, attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

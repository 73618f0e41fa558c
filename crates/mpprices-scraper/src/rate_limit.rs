//! Rate limiting and retry utilities shared by every marketplace client.
//!
//! Provides exponential backoff retry logic for transient HTTP errors such as
//! 429 responses, and a minimum-interval gate for APIs that publish a fixed
//! request budget. Non-retriable errors (auth failures, anti-bot challenges,
//! parse failures) are propagated immediately without retrying.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ScraperError;

/// Upper bound on a single backoff sleep.
const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`]: HTTP 429.
/// - [`ScraperError::Http`]: network-level failure (connection reset, timeout).
///
/// Everything else is returned immediately. In particular
/// [`ScraperError::AntibotChallenge`] is not retried here: the anti-bot layer
/// needs a cookie refresh, not a second identical request.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::RateLimited { .. } | ScraperError::Http(_)
    )
}

/// Computes the sleep before retry number `attempt + 1`.
///
/// `base_ms * 2^attempt` jittered by ±25%, then raised to the server's
/// `Retry-After` when that is larger and capped at [`MAX_DELAY_MS`].
fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32, err: &ScraperError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.min(20));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (computed.min(MAX_DELAY_MS) as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    let floor = match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    jittered.max(floor).min(MAX_DELAY_MS)
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps (see [`backoff_delay_ms`]) and
/// tries again, up to `max_retries` additional attempts after the first try.
/// If all retries are exhausted the last error is returned.
///
/// # Backoff schedule (example with `backoff_base_ms = 2000`)
///
/// | Attempt | Sleep before next attempt |
/// |---------|--------------------------|
/// | 0 (initial) | none |
/// | 1 (first retry) | 2 s ± 25% |
/// | 2 (second retry) | 4 s ± 25% |
/// | 3 (third retry) | 8 s ± 25% |
///
/// With `max_retries = 2` the operation is attempted at most 3 times total.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt, &err);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient marketplace error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// Enforces a minimum gap between consecutive requests sharing one gate.
///
/// The Wildberries Content API allows 100 requests per minute per token,
/// so its client holds a 600 ms gate.
#[derive(Debug)]
pub struct MinInterval {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinInterval {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Sleeps until at least `interval` has passed since the previous call.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

//! Retry logic with exponential backoff, jitter and a global time budget.
//!
//! Every retried operation gets a [`RetryBudget`] derived from the runtime
//! [`Settings`](super::Settings). Only failures that [`is_transient`]
//! accepts are retried; everything else is raised on the first attempt.

use std::future::Future;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::Instant;

use super::config::Settings;

/// Hard ceiling for a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Budget reserved for the final attempt when deriving the backoff ceiling.
const FINAL_ATTEMPT_RESERVE: Duration = Duration::from_secs(5);

/// No retry is scheduled when less than this much budget remains.
const MIN_REMAINING: Duration = Duration::from_secs(1);

/// Symmetric jitter applied to each delay (±25%).
const JITTER_RATIO: f64 = 0.25;

/// Retry parameters for one logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Retries after the initial attempt (0 = no retries).
    pub max_retries: u32,

    /// Delay before the first retry; doubled on each subsequent retry.
    pub base_delay: Duration,

    /// Ceiling for a single delay, derived from `total`.
    pub max_delay: Duration,

    /// Wall-clock budget shared by all attempts.
    pub total: Duration,
}

impl RetryBudget {
    /// Create a budget, deriving the delay ceiling from the total budget.
    ///
    /// The ceiling is `min(10s, (total - 5s) / 2)` so the last attempt keeps
    /// roughly five seconds of budget even with a short timeout.
    pub fn new(max_retries: u32, base_delay: Duration, total: Duration) -> Self {
        let max_delay = MAX_BACKOFF.min(total.saturating_sub(FINAL_ATTEMPT_RESERVE) / 2);
        Self { max_retries, base_delay, max_delay, total }
    }

    /// Budget from resolved runtime settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.max_retries, settings.retry_delay, settings.timeout)
    }

    /// Single attempt, no retries.
    pub fn no_retry(total: Duration) -> Self {
        Self::new(0, Duration::ZERO, total)
    }

    /// Delay before retrying after the given (zero-based) failed attempt.
    ///
    /// `jitter` is a sample in `[0, 1]`; 0.5 yields the exact exponential
    /// delay. The result never exceeds `remaining - 1s`.
    pub fn delay_for_attempt(&self, attempt: u32, jitter: f64, remaining: Duration) -> Duration {
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let capped = exponential.min(self.max_delay);

        let factor = 1.0 + (jitter.clamp(0.0, 1.0) * 2.0 - 1.0) * JITTER_RATIO;
        let jittered = capped.mul_f64(factor);

        jittered.min(remaining.saturating_sub(MIN_REMAINING))
    }
}

/// Errors produced by the retry engine itself.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetryError {
    #[error("{label}: timeout budget of {:.1}s exhausted before any attempt", budget.as_secs_f64())]
    BudgetExhausted { label: String, budget: Duration },

    #[error("{label}: timeout after {:.1}s", budget.as_secs_f64())]
    TimedOut { label: String, budget: Duration },
}

/// Run `operation` until it succeeds, fails fatally, or the budget runs out.
///
/// The error returned is always the last real failure observed, so callers
/// see the root cause rather than a generic timeout.
pub async fn with_retry<T, E, F, Fut>(budget: &RetryBudget, label: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + From<RetryError> + 'static,
{
    let start = Instant::now();
    let mut last_error: Option<E> = None;

    for attempt in 0..=budget.max_retries {
        let elapsed = start.elapsed();
        if elapsed >= budget.total {
            tracing::debug!(label, attempt, "retry budget spent");
            break;
        }

        // Attempts are bounded by what is left of the budget
        let outcome = match tokio::time::timeout(budget.total - elapsed, operation()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::debug!(label, attempt, "attempt ran out of budget");
                if let Some(previous) = last_error.take() {
                    return Err(previous);
                }
                Err(E::from(RetryError::TimedOut { label: label.to_string(), budget: budget.total }))
            }
        };

        let error = match outcome {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(label, attempts = attempt + 1, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        let remaining = budget.total.saturating_sub(start.elapsed());
        if attempt == budget.max_retries || !is_transient(&error) || remaining < MIN_REMAINING {
            return Err(error);
        }

        let delay = budget.delay_for_attempt(attempt, rand_jitter(), remaining);
        tracing::debug!(
            label,
            attempt = attempt + 1,
            max_retries = budget.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
        last_error = Some(error);
    }

    Err(last_error.unwrap_or_else(|| {
        E::from(RetryError::BudgetExhausted { label: label.to_string(), budget: budget.total })
    }))
}

/// Simple pseudo-random jitter (0.0 to 1.0) without external deps.
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    f64::from(nanos % 1000) / 1000.0
}

static HTTP_STATUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*(?:502|503|504|429)\b
        | \bhttp(?:/\d(?:\.\d)?)?[\s:]+(?:502|503|504|429)\b
        | \bstatus(?:\s+code)?[\s:=]+(?:502|503|504|429)\b
        | \b(?:502\s+bad\s+gateway|503\s+service\s+unavailable|504\s+gateway\s+time-?out|429\s+too\s+many\s+requests)\b
        ",
    )
    .expect("valid status regex")
});

static NETWORK_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bnetwork\s+(?:error|fail\w*|unavailable|timeout)\b|\bconnection\s+(?:reset|refused|timeout)\b|\btimeout\b",
    )
    .expect("valid network regex")
});

static DNS_FAILURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bname\s+(?:or\s+service\s+)?not\s+(?:found|known)\b|\btemporary\s+failure\s+in\s+name\s+resolution\b|\bfailed\s+to\s+lookup\s+address\b",
    )
    .expect("valid dns regex")
});

/// Classify an error as retryable.
///
/// Network-level faults anywhere in the source chain are transient. After
/// that the rendered message is checked for gateway/rate-limit statuses and
/// common network phrases, matching on word boundaries only.
pub fn is_transient(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if is_transient_io(io) {
                return true;
            }
        }
        if let Some(http) = err.downcast_ref::<reqwest::Error>() {
            if http.is_connect() || http.is_timeout() {
                return true;
            }
        }
        current = err.source();
    }

    is_transient_message(&error.to_string())
}

/// Message-only half of [`is_transient`].
pub fn is_transient_message(message: &str) -> bool {
    HTTP_STATUS.is_match(message) || NETWORK_PHRASE.is_match(message)
}

fn is_transient_io(error: &std::io::Error) -> bool {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::TimedOut
        | ErrorKind::BrokenPipe
        | ErrorKind::NetworkUnreachable
        | ErrorKind::HostUnreachable => true,
        _ => DNS_FAILURE.is_match(&error.to_string()),
    }
}

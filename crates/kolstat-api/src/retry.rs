//! Bounded retry for the platform's transient-unavailability signal.
//!
//! The only retryable outcome is [`ApiError::Transient`] (HTTP 406): the
//! platform legitimately has no data for some identity/variant combinations
//! and reports that as a temporary condition. Exhausting attempts therefore
//! resolves to `Ok(None)` — "no data", not a failure. Every other error is
//! returned on the first occurrence.
//!
//! The delay is fixed rather than exponential, matching the platform client
//! this was lifted from; see DESIGN.md for the trade-off.

use std::future::Future;
use std::time::Duration;

use kolstat_core::CancelToken;

use crate::error::ApiError;

/// Attempt count and fixed inter-attempt delay for one sub-fetch.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            // A zero-attempt policy would silently skip the fetch.
            max_attempts: max_attempts.max(1),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Runs `operation` under `policy`.
///
/// Returns `Ok(Some(value))` on success, `Ok(None)` when every attempt came
/// back transient (or the run was stopped mid-retry), and `Err` immediately
/// on any non-transient error. The cancel token is checked before each retry
/// sleep so a stop request is honoured without waiting out the delay.
///
/// # Errors
///
/// The first non-transient [`ApiError`] produced by `operation`.
pub async fn run_transient<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancelToken,
    mut operation: F,
) -> Result<Option<T>, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(Some(value)),
            Err(err) if err.is_transient() => {
                if attempt >= policy.max_attempts {
                    tracing::debug!(
                        attempts = attempt,
                        error = %err,
                        "data still unavailable after final attempt — treating as empty"
                    );
                    return Ok(None);
                }
                if cancel.is_stopped() {
                    return Ok(None);
                }
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient platform status — retrying after fixed delay"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

//! Resilient external call pipeline.
//!
//! Wraps one remote HTTP call with a per-call-site retry policy. Callers get
//! a `CallOutcome` back, never an error: transient statuses are absorbed by
//! backoff until the policy is exhausted, everything else fails fast.

use std::time::Duration;

use reqwest::RequestBuilder;
use reqwest::header::RETRY_AFTER;
use thiserror::Error;
use tracing::{info, warn};

/// Retry policy for a single call site. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct CallPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl CallPolicy {
    pub fn new(
        max_retries: u32,
        initial_backoff: Duration,
        backoff_multiplier: f64,
        max_backoff: Duration,
        retryable_statuses: Vec<u16>,
    ) -> Self {
        Self {
            max_retries,
            initial_backoff,
            backoff_multiplier,
            max_backoff,
            retryable_statuses,
        }
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Backoff before retrying after attempt `k` (0-indexed):
    /// `min(initial * multiplier^k, max)`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let raw = self.initial_backoff.mul_f64(factor);
        raw.min(self.max_backoff)
    }
}

/// Why a call was abandoned without retrying.
#[derive(Debug, Error)]
pub enum FatalReason {
    #[error("empty or invalid content: {0}")]
    EmptyContent(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Result of one pipeline invocation. Exactly one variant per call.
#[derive(Debug)]
pub enum CallOutcome<T> {
    Success(T),
    ExhaustedRetries(T),
    FatalError(FatalReason),
}

impl<T> CallOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    /// Collapses the usable variants into their payload.
    pub fn into_result(self) -> Result<T, FatalReason> {
        match self {
            CallOutcome::Success(value) | CallOutcome::ExhaustedRetries(value) => Ok(value),
            CallOutcome::FatalError(reason) => Err(reason),
        }
    }
}

fn body_snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(body).chars().take(300).collect()
}

fn retry_after_hint(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Invoke `request` (rebuilt per attempt) under `policy`.
///
/// A 200 with a non-empty body goes through `parse`; a parse failure is fatal,
/// not retried. Statuses in the policy's retryable set trigger backoff and a
/// fresh attempt, honoring a `Retry-After` seconds hint clamped to the policy
/// maximum. Any other status or transport failure is fatal on the spot. When
/// all attempts are spent, `fallback` (no I/O, infallible) supplies the value.
pub async fn execute<T, B, P, F>(
    label: &str,
    request: B,
    policy: &CallPolicy,
    parse: P,
    fallback: F,
) -> CallOutcome<T>
where
    B: Fn() -> RequestBuilder,
    P: Fn(&[u8]) -> anyhow::Result<T>,
    F: FnOnce() -> T,
{
    for attempt in 0..=policy.max_retries {
        let resp = match request().send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(call = label, attempt, error = %err, "transport failure");
                return CallOutcome::FatalError(FatalReason::Transport(err.to_string()));
            }
        };

        let status = resp.status();
        if status == reqwest::StatusCode::OK {
            let body = match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(call = label, attempt, error = %err, "response read failed");
                    return CallOutcome::FatalError(FatalReason::Transport(err.to_string()));
                }
            };
            info!(call = label, attempt, status = status.as_u16(), "attempt completed");
            if body.is_empty() {
                return CallOutcome::FatalError(FatalReason::EmptyContent(
                    "empty response body".to_string(),
                ));
            }
            return match parse(&body) {
                Ok(value) => CallOutcome::Success(value),
                Err(err) => {
                    warn!(call = label, attempt, error = %err, "parse rejected 200 body");
                    CallOutcome::FatalError(FatalReason::EmptyContent(err.to_string()))
                }
            };
        }

        if !policy.is_retryable(status.as_u16()) {
            let body = resp.bytes().await.unwrap_or_default();
            warn!(call = label, attempt, status = status.as_u16(), "non-retryable status");
            return CallOutcome::FatalError(FatalReason::Status {
                status: status.as_u16(),
                body: body_snippet(&body),
            });
        }

        if attempt == policy.max_retries {
            info!(call = label, attempt, status = status.as_u16(), "retries exhausted");
            break;
        }

        let wait = retry_after_hint(resp.headers())
            .map(|hint| hint.min(policy.max_backoff))
            .unwrap_or_else(|| policy.backoff_for_attempt(attempt));
        info!(
            call = label,
            attempt,
            status = status.as_u16(),
            wait_secs = wait.as_secs_f64(),
            "retryable status, backing off"
        );
        tokio::time::sleep(wait).await;
    }

    CallOutcome::ExhaustedRetries(fallback())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_secs(max_retries: u32, initial: f64, multiplier: f64, max: f64) -> CallPolicy {
        CallPolicy::new(
            max_retries,
            Duration::from_secs_f64(initial),
            multiplier,
            Duration::from_secs_f64(max),
            vec![429, 503],
        )
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let policy = policy_secs(3, 5.0, 2.0, 60.0);
        assert_eq!(policy.backoff_for_attempt(0), Duration::from_secs(5));
        assert_eq!(policy.backoff_for_attempt(1), Duration::from_secs(10));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_secs(20));
        assert_eq!(policy.backoff_for_attempt(3), Duration::from_secs(40));
        assert_eq!(policy.backoff_for_attempt(4), Duration::from_secs(60));
        assert_eq!(policy.backoff_for_attempt(10), Duration::from_secs(60));
    }

    #[test]
    fn backoff_with_unit_multiplier_stays_flat() {
        let policy = policy_secs(2, 3.0, 1.0, 60.0);
        assert_eq!(policy.backoff_for_attempt(0), Duration::from_secs(3));
        assert_eq!(policy.backoff_for_attempt(5), Duration::from_secs(3));
    }

    #[test]
    fn retryable_set_membership() {
        let policy = policy_secs(1, 1.0, 2.0, 10.0);
        assert!(policy.is_retryable(429));
        assert!(policy.is_retryable(503));
        assert!(!policy.is_retryable(404));
        assert!(!policy.is_retryable(200));
    }

    #[test]
    fn empty_retryable_set_rejects_everything() {
        let policy = CallPolicy::new(
            3,
            Duration::from_secs(1),
            2.0,
            Duration::from_secs(10),
            Vec::new(),
        );
        assert!(!policy.is_retryable(429));
        assert!(!policy.is_retryable(503));
    }

    #[test]
    fn outcome_into_result() {
        assert_eq!(CallOutcome::Success(7).into_result().unwrap(), 7);
        assert_eq!(CallOutcome::ExhaustedRetries(9).into_result().unwrap(), 9);
        let fatal: CallOutcome<i32> =
            CallOutcome::FatalError(FatalReason::EmptyContent("x".to_string()));
        assert!(fatal.into_result().is_err());
    }
}

//! Retry with exponential backoff for upstream calls.
//!
//! ```text
//! Attempt(n) ── Success ───────────────► done
//!      │       NonRetryable ──────────► error (as-is)
//!      └─ Retryable ─ n < max ─► Backoff(delay) ─► Attempt(n+1)
//!                    n == max ─► Exhausted
//! ```
//!
//! The transition is a pure function ([`RetryState::advance`]); the executor
//! only runs the operation and waits.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::{RosterError, RosterResult};

/// Classified result of a single upstream attempt.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Retryable(RosterError),
    NonRetryable(RosterError),
}

impl<T> From<RosterResult<T>> for Outcome<T> {
    fn from(result: RosterResult<T>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) if e.is_retryable() => Self::Retryable(e),
            Err(e) => Self::NonRetryable(e),
        }
    }
}

/// Failure class of the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    NonRetryable,
}

/// What to do after an attempt.
#[derive(Debug)]
pub enum Step<T> {
    /// Terminal: hand this back to the caller.
    Done(RosterResult<T>),

    /// Wait this long, then make the next attempt.
    Backoff(Duration),
}

/// Longest server-requested wait that is honored.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Per-call retry bookkeeping. Never outlives one `execute`.
#[derive(Debug, Clone)]
pub struct RetryState {
    /// 1-based number of the attempt in flight.
    pub attempt: u32,
    pub policy: RetryPolicy,
    pub last_failure: Option<FailureClass>,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 1,
            policy: *policy,
            last_failure: None,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    /// Wait before the next attempt after `failure`.
    ///
    /// A rate-limit reply asking for a longer wait than the backoff (capped at
    /// [`MAX_RETRY_AFTER`]) is honored.
    pub fn wait_after(&self, failure: &RosterError) -> Duration {
        let backoff = self.policy.backoff(self.attempt);
        match failure {
            RosterError::RateLimited {
                retry_after: Some(after),
            } => backoff.max((*after).min(MAX_RETRY_AFTER)),
            _ => backoff,
        }
    }

    /// Apply the outcome of the current attempt.
    pub fn advance<T>(&mut self, outcome: Outcome<T>) -> Step<T> {
        match outcome {
            Outcome::Success(value) => Step::Done(Ok(value)),
            Outcome::NonRetryable(e) => {
                self.last_failure = Some(FailureClass::NonRetryable);
                Step::Done(Err(e))
            }
            Outcome::Retryable(_) if self.attempt >= self.max_attempts() => {
                self.last_failure = Some(FailureClass::Retryable);
                Step::Done(Err(RosterError::Exhausted {
                    attempts: self.attempt,
                }))
            }
            Outcome::Retryable(e) => {
                self.last_failure = Some(FailureClass::Retryable);
                let wait = self.wait_after(&e);
                self.attempt += 1;
                Step::Backoff(wait)
            }
        }
    }
}

/// Attempt budget and first backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    /// Delay before attempt `attempt + 1`: `initial_delay * 2^(attempt-1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exp)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Runs upstream operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` to abort pending backoff waits.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `operation` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// A cancelled wait yields [`RosterError::Interrupted`].
    pub async fn execute<T, F, Fut>(&self, name: &str, mut operation: F) -> RosterResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RosterResult<T>>,
    {
        let mut state = RetryState::new(&self.policy);

        loop {
            debug!(
                operation = name,
                attempt = state.attempt,
                max_attempts = state.max_attempts(),
                "calling upstream"
            );

            let outcome = Outcome::from(operation().await);
            if let Outcome::Retryable(e) = &outcome {
                if state.attempt < state.max_attempts() {
                    warn!(
                        operation = name,
                        error = %e,
                        attempt = state.attempt,
                        max_attempts = state.max_attempts(),
                        backoff_ms = state.wait_after(e).as_millis() as u64,
                        "upstream call failed, retrying"
                    );
                } else {
                    error!(
                        operation = name,
                        error = %e,
                        attempts = state.attempt,
                        "upstream call failed after all attempts"
                    );
                }
            }

            match state.advance(outcome) {
                Step::Done(result) => return result,
                Step::Backoff(wait) => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            error!(operation = name, "interrupted during backoff");
                            return Err(RosterError::Interrupted);
                        }
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }
    }
}

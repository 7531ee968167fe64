//! Resilient executor: runs one fallible remote call under a bounded retry policy.
//!
//! The executor is stateless: every `execute` call builds its own attempt log and
//! outcome, so a single executor can be shared across concurrent requests.
//! Cancellation is drop-based: dropping the returned future stops the loop at the
//! next suspension point (the pending sleep or the in-flight operation).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::resilience::classifier::{ErrorClassification, ErrorClassifier};

/// Retry budget and backoff base for one executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` means exactly one attempt.
    pub max_retries: u32,
    pub base_delay_secs: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_secs: u64) -> Self {
        Self {
            max_retries,
            base_delay_secs,
        }
    }

    /// `max_retries + 1`, widened so `u32::MAX` retries still count exactly.
    pub fn total_attempts(&self) -> u64 {
        u64::from(self.max_retries) + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, 5)
    }
}

/// Terminal result of a retry sequence. Exactly one of payload or error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome<T> {
    Success(T),
    Failure(ErrorClassification),
}

impl<T> ExecutionOutcome<T> {
    pub fn into_result(self) -> Result<T, ErrorClassification> {
        match self {
            ExecutionOutcome::Success(payload) => Ok(payload),
            ExecutionOutcome::Failure(classification) => Err(classification),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExecutionOutcome<U> {
        match self {
            ExecutionOutcome::Success(payload) => ExecutionOutcome::Success(f(payload)),
            ExecutionOutcome::Failure(classification) => ExecutionOutcome::Failure(classification),
        }
    }
}

/// One invocation of the operation. Ephemeral: lives for a single `execute` call.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based.
    pub attempt: u32,
    pub classification: Option<ErrorClassification>,
    pub succeeded: bool,
    pub at: DateTime<Utc>,
}

/// Drives the retry loop for any zero-argument async operation.
#[derive(Debug, Clone, Copy)]
pub struct ResilientExecutor {
    policy: RetryPolicy,
    classifier: ErrorClassifier,
}

impl ResilientExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            classifier: ErrorClassifier::new(policy.base_delay_secs),
        }
    }

    /// Invokes `operation` up to `max_retries + 1` times, sequentially.
    ///
    /// Never fails: every path ends in an [`ExecutionOutcome`]. Success returns
    /// immediately; a non-retryable failure or the last allowed attempt returns the
    /// classification of that attempt.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> ExecutionOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let total = self.policy.total_attempts();
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(total.min(8) as usize);

        for retry in 0..=self.policy.max_retries {
            // 1-based; only the final attempt of a u32::MAX budget saturates.
            let attempt = retry.saturating_add(1);
            let result = operation().await;

            let err = match result {
                Ok(payload) => {
                    attempts.push(AttemptRecord {
                        attempt,
                        classification: None,
                        succeeded: true,
                        at: Utc::now(),
                    });
                    if attempt > 1 {
                        info!("Remote call succeeded on attempt {attempt}/{total}");
                    }
                    return ExecutionOutcome::Success(payload);
                }
                Err(err) => err,
            };

            let classification = self.classifier.classify(&err.to_string(), attempt);
            attempts.push(AttemptRecord {
                attempt,
                classification: Some(classification.clone()),
                succeeded: false,
                at: Utc::now(),
            });

            if retry == self.policy.max_retries || !classification.retryable {
                error!(
                    kind = ?classification.kind,
                    attempts = attempts.len(),
                    "Remote call failed permanently: {}",
                    classification.raw_detail
                );
                log_attempts(&attempts);
                return ExecutionOutcome::Failure(classification);
            }

            let delay_secs = classification
                .suggested_delay_seconds
                .unwrap_or(self.policy.base_delay_secs);
            if classification.kind.is_known_transient() {
                warn!(
                    kind = ?classification.kind,
                    "Remote call attempt {attempt}/{total} failed, retrying after {delay_secs}s"
                );
            } else {
                warn!(
                    "Remote call attempt {attempt}/{total} failed with unrecognised error, \
                     retrying after {delay_secs}s: {}",
                    classification.raw_detail
                );
            }
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        }

        // Unreachable: the last iteration always returns.
        log_attempts(&attempts);
        ExecutionOutcome::Failure(ErrorClassification::retries_exhausted(format!(
            "retry loop ended after {} attempts without an outcome",
            attempts.len()
        )))
    }

    /// Like [`execute`](Self::execute), but abandons the sequence as soon as
    /// `cancel` resolves. Returns `None` when cancelled; no partial outcome.
    pub async fn execute_until<F, Fut, T, E, C>(
        &self,
        operation: F,
        cancel: C,
    ) -> Option<ExecutionOutcome<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        C: Future<Output = ()>,
    {
        tokio::select! {
            outcome = self.execute(operation) => Some(outcome),
            _ = cancel => {
                warn!("Remote call cancelled by caller");
                None
            }
        }
    }
}

fn log_attempts(attempts: &[AttemptRecord]) {
    for record in attempts {
        debug!(
            attempt = record.attempt,
            succeeded = record.succeeded,
            kind = ?record.classification.as_ref().map(|c| c.kind),
            at = %record.at.to_rfc3339(),
            "attempt record"
        );
    }
}

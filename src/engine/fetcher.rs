//! HTTP fetch executor with bounded retry
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx | Return the response |
//! | HTTP 429 | Retry with backoff |
//! | HTTP 5xx | Retry with backoff |
//! | Timeout | Retry with backoff |
//! | Connection refused | Retry with backoff |
//! | Other network failure | Retry with backoff |
//! | Other HTTP status (4xx, unfollowed 3xx) | Fail immediately |
//! | Malformed response | Fail immediately |
//!
//! Backoff after the n-th failed attempt (zero-based) is
//! `min(base * 2^n, ceiling)`. No sleep follows the final attempt.
//! A paced fetch also waits for its origin's turn before every attempt, so
//! retries never break the per-origin spacing.

use crate::engine::scheduler::Pacer;
use crate::engine::transport::{HttpResponse, HttpTransport, TransportError, TransportErrorKind};
use crate::state::Clock;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Retry ceiling and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per logical fetch (at least one)
    pub max_attempts: u32,
    /// Sleep after the first failed attempt
    pub backoff_base: Duration,
    /// Upper bound on any single sleep
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            backoff_max,
        }
    }

    /// Backoff to sleep after the failed attempt with zero-based index `attempt`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The server answered with a non-2xx status
    Status(u16),
    Timeout(String),
    Connect(String),
    Network(String),
    Malformed(String),
}

impl FailureCause {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status(status) => *status == 429 || (500..600).contains(status),
            Self::Timeout(_) | Self::Connect(_) | Self::Network(_) => true,
            Self::Malformed(_) => false,
        }
    }
}

impl From<TransportError> for FailureCause {
    fn from(e: TransportError) -> Self {
        match e.kind {
            TransportErrorKind::Timeout => Self::Timeout(e.message),
            TransportErrorKind::Connect => Self::Connect(e.message),
            TransportErrorKind::Malformed => Self::Malformed(e.message),
            TransportErrorKind::Other => Self::Network(e.message),
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP {}", status),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
            Self::Connect(msg) => write!(f, "connection failed: {}", msg),
            Self::Network(msg) => write!(f, "network error: {}", msg),
            Self::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

/// Failure of a logical fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} failed: {cause}")]
    Terminal { url: String, cause: FailureCause },

    #[error("{url} still failing after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: FailureCause,
    },

    #[error("fetch of {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// The cause of the last failed attempt, if any attempt failed
    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::Terminal { cause, .. } => Some(cause),
            Self::Exhausted { last, .. } => Some(last),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Attempt counter and current backoff for one logical fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchAttempt {
    /// Attempts made so far
    pub attempt: u32,
    /// Sleep before the next attempt
    pub backoff: Duration,
}

impl FetchAttempt {
    fn first(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            backoff: policy.backoff_for(0),
        }
    }

    /// Advances past a failed attempt; None once the budget is spent
    fn next(self, policy: &RetryPolicy) -> Option<Self> {
        let attempt = self.attempt + 1;
        if attempt >= policy.max_attempts {
            return None;
        }
        Some(Self {
            attempt,
            backoff: policy.backoff_for(attempt),
        })
    }
}

/// Performs GET requests with bounded retry and exponential backoff
pub struct FetchExecutor {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl FetchExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, retrying transient failures
    pub async fn fetch(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        self.fetch_with_cancel(url, &CancellationToken::new()).await
    }

    /// Fetches `url`, aborting a pending request or backoff sleep on cancellation
    pub async fn fetch_with_cancel(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        self.run(url, None, cancel).await
    }

    /// Fetches `url`, waiting for the origin's turn before each attempt
    pub async fn fetch_paced(
        &self,
        url: &Url,
        pacer: Pacer<'_>,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        self.run(url, Some(pacer), cancel).await
    }

    async fn run(
        &self,
        url: &Url,
        pacer: Option<Pacer<'_>>,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        let mut state = FetchAttempt::first(&self.policy);

        loop {
            if let Some(pacer) = &pacer {
                pacer.wait(cancel).await.map_err(|_| self.cancelled(url))?;
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(url)),
                outcome = self.transport.get(url) => outcome,
            };

            let cause = match outcome {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => FailureCause::Status(response.status),
                Err(e) => FailureCause::from(e),
            };

            let attempt_no = state.attempt + 1;

            if !cause.is_retryable() {
                tracing::warn!("Fetching {} failed with terminal error: {}", url, cause);
                return Err(FetchError::Terminal {
                    url: url.to_string(),
                    cause,
                });
            }

            let backoff = state.backoff;
            state = match state.next(&self.policy) {
                Some(next) => next,
                None => {
                    tracing::error!(
                        "Failed to fetch {} after {} attempts: {}",
                        url,
                        attempt_no,
                        cause
                    );
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt_no,
                        last: cause,
                    });
                }
            };

            tracing::warn!(
                "Fetching {} failed (attempt {}/{}): {}; retrying in {:?}",
                url,
                attempt_no,
                self.policy.max_attempts,
                cause,
                backoff
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(url)),
                _ = self.clock.sleep(backoff) => {}
            }
        }
    }

    fn cancelled(&self, url: &Url) -> FetchError {
        tracing::info!("Fetch of {} cancelled", url);
        FetchError::Cancelled {
            url: url.to_string(),
        }
    }
}

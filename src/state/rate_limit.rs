use crate::state::clock::elapsed_between;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Tracks request pacing for a single origin
///
/// Mutated only by the rate limiter, immediately before a request is released.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    /// Number of requests released to this origin
    pub request_count: u32,

    /// Release time of the last request to this origin
    pub last_request_time: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Creates a new RateLimitState with no request history
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether a request may be released at `now` given the effective delay
    pub fn can_request(&self, delay: Duration, now: DateTime<Utc>) -> bool {
        self.time_until_next_request(delay, now).is_none()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = elapsed_between(last, now);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was released at `now`
    pub fn record_request(&mut self, now: DateTime<Utc>) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }
}

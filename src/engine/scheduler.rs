//! Per-origin rate limiter
//!
//! This module enforces a minimum spacing between consecutive requests to the
//! same origin. The effective delay for an origin is the configured default or
//! the robots.txt crawl delay, whichever is greater, capped at the configured
//! maximum.
//!
//! Each origin has its own async lock, held across the wait, so requests to
//! one origin are released one at a time while other origins proceed freely.

use crate::engine::Cancelled;
use crate::state::{Clock, RateLimitState};
use crate::url::Origin;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pacing state for one origin
///
/// `released` mirrors the state's request count so it can be read while a
/// caller holds the turn.
#[derive(Default)]
struct OriginSlot {
    state: tokio::sync::Mutex<RateLimitState>,
    released: AtomicU32,
}

/// Spaces out requests per origin
pub struct RateLimiter {
    default_delay: Duration,
    max_delay: Duration,
    clock: Arc<dyn Clock>,
    origins: Mutex<HashMap<Origin, Arc<OriginSlot>>>,
}

impl RateLimiter {
    /// Creates a rate limiter
    ///
    /// # Arguments
    ///
    /// * `default_delay` - Minimum spacing applied to every origin
    /// * `max_delay` - Cap on the effective delay, whatever robots.txt asks for
    /// * `clock` - Time source used for waiting
    pub fn new(default_delay: Duration, max_delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            default_delay,
            max_delay: max_delay.max(default_delay),
            clock,
            origins: Mutex::new(HashMap::new()),
        }
    }

    /// Effective spacing given an optional robots.txt crawl delay
    pub fn effective_delay(&self, crawl_delay: Option<Duration>) -> Duration {
        crawl_delay
            .map_or(self.default_delay, |robots| robots.max(self.default_delay))
            .min(self.max_delay)
    }

    /// Waits until a request to `origin` may be released
    ///
    /// The release time, not the call time, is recorded as the origin's last
    /// request, so back-to-back calls compound.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The caller may issue its request now
    /// * `Err(Cancelled)` - `cancel` fired before the turn came; nothing was recorded
    pub async fn await_turn(
        &self,
        origin: &Origin,
        crawl_delay: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let delay = self.effective_delay(crawl_delay);
        let slot = self.slot(origin);

        let mut state = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            state = slot.state.lock() => state,
        };

        if let Some(wait) = state.time_until_next_request(delay, self.clock.now()) {
            tracing::debug!("Waiting {:?} before next request to {}", wait, origin);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Cancelled),
                _ = self.clock.sleep(wait) => {}
            }
        }

        state.record_request(self.clock.now());
        slot.released.store(state.request_count, Ordering::Release);
        Ok(())
    }

    /// Number of requests released to `origin` so far
    pub fn request_count(&self, origin: &Origin) -> u32 {
        let slot = {
            let origins = self.origins.lock().unwrap_or_else(|e| e.into_inner());
            origins.get(origin).cloned()
        };
        slot.map_or(0, |slot| slot.released.load(Ordering::Acquire))
    }

    /// Binds this limiter to one origin, for callers that pace several requests
    pub fn pacer<'a>(&'a self, origin: &'a Origin, crawl_delay: Option<Duration>) -> Pacer<'a> {
        Pacer {
            limiter: self,
            origin,
            crawl_delay,
        }
    }

    fn slot(&self, origin: &Origin) -> Arc<OriginSlot> {
        let mut origins = self.origins.lock().unwrap_or_else(|e| e.into_inner());
        origins.entry(origin.clone()).or_default().clone()
    }
}

/// A rate limiter bound to one origin and its crawl delay
#[derive(Clone, Copy)]
pub struct Pacer<'a> {
    limiter: &'a RateLimiter,
    origin: &'a Origin,
    crawl_delay: Option<Duration>,
}

impl Pacer<'_> {
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        self.limiter
            .await_turn(self.origin, self.crawl_delay, cancel)
            .await
    }

    pub fn origin(&self) -> &Origin {
        self.origin
    }
}

//! Robots.txt handling module
//!
//! This module fetches, parses, and remembers robots.txt per origin, and
//! answers whether a URL may be fetched and how long to wait between requests.
//! A robots.txt that cannot be fetched (network error or non-2xx status) is
//! treated as allow-all with no crawl delay.

mod parser;

pub use parser::ParsedRobots;

use crate::engine::{Cancelled, HttpTransport, RateLimiter};
use crate::url::Origin;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use url::Url;

type RulesCell = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Per-origin robots.txt policy, fetched lazily and kept for the process lifetime
pub struct RobotsPolicyGate {
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<RateLimiter>,
    /// Product token matched against `User-agent` groups
    user_agent: String,
    /// One cell per origin so a slow fetch only blocks callers for that origin
    rules: Mutex<HashMap<Origin, RulesCell>>,
}

impl RobotsPolicyGate {
    /// Creates a gate that fetches robots.txt through `transport`
    ///
    /// The robots.txt request is paced by `limiter` like any other request
    /// to the origin.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        limiter: Arc<RateLimiter>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            limiter,
            user_agent: user_agent.into(),
            rules: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Checks whether `url` may be fetched
    ///
    /// URLs without an http(s) origin are never allowed.
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let Ok(origin) = Origin::from_url(url) else {
            return false;
        };
        // An uncancelled token never fires, so this cannot fail
        self.check(&origin, url, &CancellationToken::new())
            .await
            .unwrap_or(false)
    }

    /// Returns the robots.txt crawl delay for `origin`, if one applies to us
    pub async fn crawl_delay(&self, origin: &Origin) -> Option<Duration> {
        self.rules_for(origin, &CancellationToken::new())
            .await
            .ok()
            .and_then(|rules| rules.crawl_delay(&self.user_agent))
    }

    /// Cancellable form of [`is_allowed`](Self::is_allowed)
    pub async fn check(
        &self,
        origin: &Origin,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<bool, Cancelled> {
        let rules = self.rules_for(origin, cancel).await?;
        Ok(rules.is_allowed(url.as_str(), &self.user_agent))
    }

    /// Returns the rules for `origin`, fetching robots.txt on first use
    ///
    /// If the fetch is cancelled, nothing is remembered and the next caller
    /// fetches again.
    ///
    /// The origin's cell stays claimed while the robots.txt request waits for
    /// its rate-limit turn. Only callers for the same origin queue behind it.
    pub async fn rules_for(
        &self,
        origin: &Origin,
        cancel: &CancellationToken,
    ) -> Result<Arc<ParsedRobots>, Cancelled> {
        let cell = {
            let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
            rules.entry(origin.clone()).or_default().clone()
        };

        cell.get_or_try_init(|| self.fetch_rules(origin, cancel))
            .await
            .cloned()
    }

    /// Number of origins whose robots.txt has been resolved
    pub fn known_origins(&self) -> usize {
        let rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        rules.values().filter(|cell| cell.initialized()).count()
    }

    async fn fetch_rules(
        &self,
        origin: &Origin,
        cancel: &CancellationToken,
    ) -> Result<Arc<ParsedRobots>, Cancelled> {
        let robots_url = match origin.robots_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build robots.txt URL for {}: {}", origin, e);
                return Ok(Arc::new(ParsedRobots::allow_all()));
            }
        };

        self.limiter.await_turn(origin, None, cancel).await?;

        tracing::debug!("Fetching {}", robots_url);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            response = self.transport.get(&robots_url) => response,
        };

        let rules = match response {
            Ok(response) if response.is_success() => {
                tracing::info!("Loaded robots.txt for {}", origin);
                ParsedRobots::from_content(&response.body)
            }
            Ok(response) => {
                tracing::warn!(
                    "robots.txt for {} returned HTTP {}; allowing all",
                    origin,
                    response.status
                );
                ParsedRobots::allow_all()
            }
            Err(e) => {
                tracing::warn!(
                    "Could not fetch robots.txt for {}: {}; allowing all",
                    origin,
                    e
                );
                ParsedRobots::allow_all()
            }
        };

        Ok(Arc::new(rules))
    }
}

//! Scrape orchestration
//!
//! One `scrape()` call walks a fixed sequence, each step short-circuiting on
//! failure:
//! 1. Resolve the strategy's target against the base URL
//! 2. Look up the canonical key in the response cache; a hit skips to step 5
//! 3. Check robots.txt for the target's origin
//! 4. Wait for the origin's turn, fetch with retry, cache the body
//! 5. Hand the body to the strategy's parser

use crate::cache::{open_store, CacheResult, CacheStore, ResponseCache};
use crate::config::{validate, Config};
use crate::engine::{FetchError, FetchExecutor, HttpTransport, RateLimiter, ReqwestTransport, RetryPolicy};
use crate::robots::RobotsPolicyGate;
use crate::state::{Clock, SystemClock};
use crate::strategy::ScrapingStrategy;
use crate::url::{canonical_key, resolve_target, Origin};
use crate::{ConfigError, ScrapeError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Composes robots policy, rate limiting, caching and fetching behind `scrape()`
pub struct Orchestrator {
    base_url: Url,
    robots: RobotsPolicyGate,
    limiter: Arc<RateLimiter>,
    cache: ResponseCache,
    executor: FetchExecutor,
}

impl Orchestrator {
    /// Creates an orchestrator with the production transport, clock and cache
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration; it is validated again here
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to scrape
    /// * `Err(PoliteError)` - Invalid configuration, HTTP client or cache store failure
    pub fn new(config: &Config) -> crate::Result<Self> {
        Self::builder(config).build()
    }

    /// Starts a builder that allows swapping the transport, clock or cache store
    pub fn builder(config: &Config) -> OrchestratorBuilder<'_> {
        OrchestratorBuilder {
            config,
            transport: None,
            clock: None,
            store: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn robots(&self) -> &RobotsPolicyGate {
        &self.robots
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Runs one scrape to completion
    pub async fn scrape<S: ScrapingStrategy>(&self, strategy: &S) -> Result<S::Output, ScrapeError> {
        self.scrape_with_cancel(strategy, &CancellationToken::new())
            .await
    }

    /// Runs one scrape, aborting any pending wait or request when `cancel` fires
    pub async fn scrape_with_cancel<S: ScrapingStrategy>(
        &self,
        strategy: &S,
        cancel: &CancellationToken,
    ) -> Result<S::Output, ScrapeError> {
        let url = resolve_target(&self.base_url, &strategy.target_url())?;
        let body = self.fetch_content(&url, cancel).await?;

        strategy
            .parse(&body)
            .map_err(|source| ScrapeError::ParseFailed {
                url: url.to_string(),
                source,
            })
    }

    /// Returns the body for `url`, from cache when fresh, otherwise from the network
    ///
    /// A cache hit performs no robots check and no network call. A failed
    /// fetch leaves the cache untouched.
    pub async fn fetch_content(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, ScrapeError> {
        let key = canonical_key(url);
        if let Some(entry) = self.cache.get(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(entry.body);
        }

        let origin = Origin::from_url(url)?;
        let cancelled = || ScrapeError::Cancelled {
            url: url.to_string(),
        };

        let rules = self
            .robots
            .rules_for(&origin, cancel)
            .await
            .map_err(|_| cancelled())?;

        if !rules.is_allowed(url.as_str(), self.robots.user_agent()) {
            tracing::info!("Skipping {}: disallowed by robots.txt", url);
            return Err(ScrapeError::Disallowed {
                url: url.to_string(),
            });
        }

        let crawl_delay = rules.crawl_delay(self.robots.user_agent());
        let pacer = self.limiter.pacer(&origin, crawl_delay);

        tracing::info!("Fetching {}", url);
        let response = match self.executor.fetch_paced(url, pacer, cancel).await {
            Ok(response) => response,
            Err(FetchError::Cancelled { .. }) => return Err(cancelled()),
            Err(source) => {
                return Err(ScrapeError::FetchFailed {
                    url: url.to_string(),
                    source,
                })
            }
        };

        let entry = self.cache.put(&key, response.body, response.status);
        Ok(entry.body)
    }

    /// Drops every cached response
    pub fn clear_cache(&self) -> CacheResult<()> {
        self.cache.clear()
    }
}

/// Builder for [`Orchestrator`]
///
/// Unset parts default to the reqwest transport, the system clock and the
/// cache backend named in the configuration.
pub struct OrchestratorBuilder<'a> {
    config: &'a Config,
    transport: Option<Arc<dyn HttpTransport>>,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn CacheStore>>,
}

impl OrchestratorBuilder<'_> {
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> crate::Result<Orchestrator> {
        validate(self.config)?;
        let scraper = &self.config.scraper;

        let base_url = Url::parse(&scraper.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", scraper.base_url, e)))?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(
                &self.config.user_agent,
                scraper,
            )?),
        };
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = match self.store {
            Some(store) => store,
            None => open_store(&self.config.cache)?,
        };

        let limiter = Arc::new(RateLimiter::new(
            scraper.request_delay(),
            scraper.max_crawl_delay(),
            clock.clone(),
        ));
        let robots = RobotsPolicyGate::new(
            transport.clone(),
            limiter.clone(),
            self.config.user_agent.crawler_name.clone(),
        );
        let cache = ResponseCache::new(store, scraper.cache_ttl(), clock.clone());
        let policy = RetryPolicy::new(
            scraper.max_retries,
            scraper.backoff_base(),
            scraper.backoff_max(),
        );
        let executor = FetchExecutor::new(transport, clock, policy);

        tracing::debug!(
            "Orchestrator ready for {} (delay {:?}, ttl {:?}, {} attempts)",
            base_url,
            scraper.request_delay(),
            scraper.cache_ttl(),
            policy.max_attempts
        );

        Ok(Orchestrator {
            base_url,
            robots,
            limiter,
            cache,
            executor,
        })
    }
}

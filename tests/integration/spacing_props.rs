//! Property tests for per-origin request spacing
//!
//! A manual clock records every release, so the spacing between consecutive
//! requests to one origin can be checked exactly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polite_fetch::config::Config;
use polite_fetch::engine::{HttpResponse, HttpTransport, RateLimiter, TransportError};
use polite_fetch::state::{Clock, ManualClock};
use polite_fetch::strategy::{ParseError, ScrapingStrategy};
use polite_fetch::{Orchestrator, Origin};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const HOSTS: [&str; 3] = ["https://a.test/", "https://b.test/", "https://c.test/"];

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn gap(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}

/// Answers from a status script and logs the time of every request per host
struct LoggingSite {
    clock: Arc<ManualClock>,
    statuses: Mutex<Vec<u16>>,
    log: Mutex<Vec<(String, DateTime<Utc>)>>,
}

#[async_trait]
impl HttpTransport for LoggingSite {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let host = url.host_str().unwrap_or_default().to_string();
        self.log.lock().unwrap().push((host, self.clock.now()));

        let status = if url.path() == "/robots.txt" {
            404
        } else {
            self.statuses.lock().unwrap().pop().unwrap_or(200)
        };
        Ok(HttpResponse {
            status,
            body: "ok".to_string(),
            final_url: url.to_string(),
        })
    }
}

struct Raw(String);

impl ScrapingStrategy for Raw {
    type Output = String;

    fn target_url(&self) -> String {
        self.0.clone()
    }

    fn parse(&self, content: &str) -> Result<String, ParseError> {
        Ok(content.to_string())
    }
}

proptest! {
    #[test]
    fn test_limiter_release_times_respect_effective_delay(
        default_ms in 0u64..3_000,
        calls in prop::collection::vec(
            (0usize..HOSTS.len(), 0u64..5_000, prop::option::of(0u64..10_000)),
            1..40,
        ),
    ) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::new(
            Duration::from_millis(default_ms),
            Duration::from_secs(8),
            clock.clone(),
        );
        let cancel = CancellationToken::new();
        let mut last_release: HashMap<usize, DateTime<Utc>> = HashMap::new();

        runtime().block_on(async {
            for (host, idle_ms, robots_ms) in calls {
                clock.advance(Duration::from_millis(idle_ms));
                let origin = Origin::from_url(&Url::parse(HOSTS[host]).unwrap()).unwrap();
                let crawl_delay = robots_ms.map(Duration::from_millis);

                limiter.await_turn(&origin, crawl_delay, &cancel).await.unwrap();
                let released = clock.now();

                if let Some(previous) = last_release.insert(host, released) {
                    let required = limiter.effective_delay(crawl_delay);
                    prop_assert!(gap(previous, released) >= required);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn test_scrapes_with_retries_keep_origin_spacing(
        delay_ms in 1u64..4_000,
        statuses in prop::collection::vec(prop::sample::select(vec![200u16, 429, 500, 503]), 0..20),
        targets in prop::collection::vec((0usize..HOSTS.len(), 0u32..5), 1..15),
    ) {
        let clock = Arc::new(ManualClock::new());
        let site = Arc::new(LoggingSite {
            clock: clock.clone(),
            statuses: Mutex::new(statuses),
            log: Mutex::new(Vec::new()),
        });

        let mut config = Config::default();
        config.scraper.request_delay_seconds = delay_ms as f64 / 1000.0;
        config.scraper.max_retries = 3;
        config.scraper.backoff_base_seconds = 0.1;
        config.scraper.backoff_max_seconds = 0.4;
        let orchestrator = Orchestrator::builder(&config)
            .transport(site.clone())
            .clock(clock.clone())
            .build()
            .unwrap();

        runtime().block_on(async {
            for (host, page) in targets {
                let target = format!("{}page/{}", HOSTS[host], page);
                // Failures are fine here; only the request timing matters
                let _ = orchestrator.scrape(&Raw(target)).await;
            }
        });

        let required = Duration::from_secs_f64(delay_ms as f64 / 1000.0);
        let mut last_seen: HashMap<String, DateTime<Utc>> = HashMap::new();
        for (host, at) in site.log.lock().unwrap().iter() {
            if let Some(previous) = last_seen.insert(host.clone(), *at) {
                prop_assert!(gap(previous, *at) >= required);
            }
        }
    }
}

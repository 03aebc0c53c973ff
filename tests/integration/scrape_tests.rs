//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to create mock HTTP servers and drive the real
//! reqwest transport end-to-end. A manual clock stands in for wall time so
//! rate-limit and backoff waits return immediately.

use polite_fetch::config::{CacheBackend, Config};
use polite_fetch::state::ManualClock;
use polite_fetch::strategy::{
    PageSummaryStrategy, ParseError, ScrapingStrategy, SelectorStrategy, TableStrategy,
};
use polite_fetch::{FetchError, Orchestrator, ScrapeError, ScrapeErrorKind};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html><head><title>Data</title></head>
<body><h1>Quarterly data</h1>
<table class="wikitable"><tr><th>Year</th><th>Value</th></tr>
<tr><td>2023</td><td>41[1]</td></tr><tr><td>2024</td><td>42</td></tr></table>
</body></html>"#;

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.scraper.base_url = base_url.to_string();
    config.scraper.request_delay_seconds = 1.0;
    config.scraper.cache_ttl_seconds = 300;
    config.scraper.max_retries = 3;
    config.scraper.backoff_base_seconds = 1.0;
    config.scraper.backoff_max_seconds = 8.0;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn build(config: &Config) -> (Orchestrator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let orchestrator = Orchestrator::builder(config)
        .clock(clock.clone())
        .build()
        .expect("Failed to build orchestrator");
    (orchestrator, clock)
}

async fn requests_to(server: &MockServer, target: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == target)
        .count()
}

async fn total_requests(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_robots_then_cached_second_scrape() {
    let server = MockServer::start().await;
    // No robots.txt mock: wiremock answers 404
    mount_page(&server, "/data", PAGE).await;

    let (orchestrator, _clock) = build(&create_test_config(&server.uri()));
    let strategy = TableStrategy::new("/data");

    let first = orchestrator.scrape(&strategy).await.unwrap();
    assert_eq!(requests_to(&server, "/robots.txt").await, 1);
    assert_eq!(requests_to(&server, "/data").await, 1);
    let requests_after_first = total_requests(&server).await;

    let second = orchestrator.scrape(&strategy).await.unwrap();
    assert_eq!(total_requests(&server).await, requests_after_first);

    assert_eq!(first.len(), 2);
    assert_eq!(first[0]["Value"], "41");
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_robots_disallow_blocks_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"))
        .mount(&server)
        .await;
    mount_page(&server, "/private/report", PAGE).await;
    mount_page(&server, "/public/report", PAGE).await;

    let (orchestrator, _clock) = build(&create_test_config(&server.uri()));

    let err = orchestrator
        .scrape(&PageSummaryStrategy::new("/private/report"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ScrapeErrorKind::Disallowed);
    assert_eq!(requests_to(&server, "/private/report").await, 0);

    let summary = orchestrator
        .scrape(&PageSummaryStrategy::new("/public/report"))
        .await
        .unwrap();
    assert_eq!(summary.title.as_deref(), Some("Data"));
    assert_eq!(requests_to(&server, "/robots.txt").await, 1);
}

#[tokio::test]
async fn test_robots_crawl_delay_spaces_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 5"))
        .mount(&server)
        .await;
    mount_page(&server, "/a", PAGE).await;
    mount_page(&server, "/b", PAGE).await;

    let (orchestrator, clock) = build(&create_test_config(&server.uri()));

    orchestrator.scrape(&PageSummaryStrategy::new("/a")).await.unwrap();
    orchestrator.scrape(&PageSummaryStrategy::new("/b")).await.unwrap();

    // robots.txt at t=0, then /a and /b five seconds apart each
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(5); 2]);
}

#[tokio::test]
async fn test_always_503_exhausts_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&server)
        .await;

    let (orchestrator, _clock) = build(&create_test_config(&server.uri()));

    let err = orchestrator
        .scrape(&PageSummaryStrategy::new("/data"))
        .await
        .unwrap_err();

    match err {
        ScrapeError::FetchFailed {
            source: FetchError::Exhausted { attempts, .. },
            ..
        } => assert_eq!(attempts, 3),
        other => panic!("expected exhausted fetch, got {:?}", other),
    }

    // The failure was not cached: another scrape goes back to the network
    let _ = orchestrator.scrape(&PageSummaryStrategy::new("/data")).await;
    assert_eq!(requests_to(&server, "/data").await, 6);
}

#[tokio::test]
async fn test_succeeds_on_third_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/data", PAGE).await;

    let (orchestrator, _clock) = build(&create_test_config(&server.uri()));

    let summary = orchestrator
        .scrape(&PageSummaryStrategy::new("/data"))
        .await
        .unwrap();

    assert_eq!(summary.heading.as_deref(), Some("Quarterly data"));
    assert_eq!(requests_to(&server, "/data").await, 3);
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let server = MockServer::start().await;

    let (orchestrator, clock) = build(&create_test_config(&server.uri()));

    let err = orchestrator
        .scrape(&PageSummaryStrategy::new("/missing"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::FetchFailed {
            source: FetchError::Terminal { .. },
            ..
        }
    ));
    assert_eq!(requests_to(&server, "/missing").await, 1);
    // Only the spacing wait after robots.txt, no backoff
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn test_parse_failure_is_reported_and_body_stays_cached() {
    let server = MockServer::start().await;
    mount_page(&server, "/data", PAGE).await;

    let (orchestrator, _clock) = build(&create_test_config(&server.uri()));

    let err = orchestrator
        .scrape(&SelectorStrategy::new("/data", "div.absent"))
        .await
        .unwrap_err();
    match err {
        ScrapeError::ParseFailed { source, .. } => {
            assert!(matches!(source, ParseError::MissingElement(_)))
        }
        other => panic!("expected parse failure, got {:?}", other),
    }

    // A different strategy over the same page is served from cache
    let cells = orchestrator
        .scrape(&SelectorStrategy::new("/data", "td"))
        .await
        .unwrap();
    assert_eq!(cells, vec!["2023", "41[1]", "2024", "42"]);
    assert_eq!(requests_to(&server, "/data").await, 1);
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let (orchestrator, _clock) = build(&create_test_config(&server.uri()));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let err = orchestrator
        .scrape_with_cancel(&PageSummaryStrategy::new("/slow"), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ScrapeErrorKind::Cancelled);
}

#[tokio::test]
async fn test_sqlite_cache_survives_restart() {
    let server = MockServer::start().await;
    mount_page(&server, "/data", PAGE).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri());
    config.cache.backend = CacheBackend::Sqlite;
    config.cache.path = dir.path().join("cache.db").to_string_lossy().to_string();

    {
        let (orchestrator, _clock) = build(&config);
        orchestrator.scrape(&PageSummaryStrategy::new("/data")).await.unwrap();
    }
    let requests_after_first = total_requests(&server).await;

    let (orchestrator, _clock) = build(&config);
    let summary = orchestrator
        .scrape(&PageSummaryStrategy::new("/data"))
        .await
        .unwrap();

    assert_eq!(summary.title.as_deref(), Some("Data"));
    assert_eq!(total_requests(&server).await, requests_after_first);
}

#[tokio::test]
async fn test_absolute_target_ignores_base_url() {
    let server = MockServer::start().await;
    mount_page(&server, "/elsewhere", PAGE).await;

    let config = create_test_config("https://unused.example.com");
    let (orchestrator, _clock) = build(&config);

    let strategy = PageSummaryStrategy::new(format!("{}/elsewhere", server.uri()));
    assert!(strategy.target_url().starts_with("http://"));

    let summary = orchestrator.scrape(&strategy).await.unwrap();
    assert_eq!(summary.title.as_deref(), Some("Data"));
}

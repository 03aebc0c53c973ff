use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Polite-Fetch
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Fetch policy configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Root that strategy targets are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Minimum time between requests to the same origin (seconds)
    #[serde(rename = "request-delay-seconds")]
    pub request_delay_seconds: f64,

    /// Upper bound on the effective per-origin delay (seconds)
    #[serde(rename = "max-crawl-delay-seconds")]
    pub max_crawl_delay_seconds: f64,

    /// Freshness window for cached responses (seconds)
    #[serde(rename = "cache-ttl-seconds")]
    pub cache_ttl_seconds: u64,

    /// Total number of attempts per logical fetch
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before the first retry (seconds)
    #[serde(rename = "backoff-base-seconds")]
    pub backoff_base_seconds: f64,

    /// Ceiling on any single backoff sleep (seconds)
    #[serde(rename = "backoff-max-seconds")]
    pub backoff_max_seconds: f64,

    /// Per-request timeout handed to the HTTP client (seconds)
    #[serde(rename = "request-timeout-seconds")]
    pub request_timeout_seconds: u64,
}

impl ScraperConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_seconds)
    }

    pub fn max_crawl_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_crawl_delay_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_base_seconds)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_max_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://example.com".to_string(),
            request_delay_seconds: 1.0,
            max_crawl_delay_seconds: 60.0,
            cache_ttl_seconds: 3600,
            max_retries: 3,
            backoff_base_seconds: 1.0,
            backoff_max_seconds: 30.0,
            request_timeout_seconds: 10,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the product token matched against robots.txt
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PoliteFetch".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

/// Which backing store holds cached responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-memory for the process lifetime
    #[default]
    Memory,
    /// SQLite file that survives restarts
    Sqlite,
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Path to the SQLite database file (sqlite backend only)
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            path: "scraper_cache.db".to_string(),
        }
    }
}

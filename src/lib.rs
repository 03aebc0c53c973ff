//! Polite-Fetch: a fetch-policy engine for pluggable page scrapers
//!
//! This crate decides whether, when, and how to issue an HTTP request on behalf
//! of a [`strategy::ScrapingStrategy`]: it honors robots.txt, paces requests per
//! origin, caches fresh responses, and retries transient failures with backoff.

pub mod cache;
pub mod config;
pub mod engine;
pub mod robots;
pub mod state;
pub mod strategy;
pub mod url;

use thiserror::Error;

/// Error raised while assembling the engine from configuration
#[derive(Debug, Error)]
pub enum PoliteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Strategy returned an empty target")]
    EmptyTarget,
}

/// Failure of a single `scrape()` call
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid target URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("URL disallowed by robots.txt: {url}")]
    Disallowed { url: String },

    #[error("Fetch failed for {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: engine::FetchError,
    },

    #[error("Parse failed for {url}: {source}")]
    ParseFailed {
        url: String,
        #[source]
        source: strategy::ParseError,
    },

    #[error("Scrape of {url} was cancelled")]
    Cancelled { url: String },
}

/// Flat classification of a [`ScrapeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeErrorKind {
    InvalidUrl,
    Disallowed,
    FetchFailed,
    ParseFailed,
    Cancelled,
}

impl ScrapeError {
    pub fn kind(&self) -> ScrapeErrorKind {
        match self {
            Self::InvalidUrl(_) => ScrapeErrorKind::InvalidUrl,
            Self::Disallowed { .. } => ScrapeErrorKind::Disallowed,
            Self::FetchFailed { .. } => ScrapeErrorKind::FetchFailed,
            Self::ParseFailed { .. } => ScrapeErrorKind::ParseFailed,
            Self::Cancelled { .. } => ScrapeErrorKind::Cancelled,
        }
    }
}

/// Result type alias for engine construction
pub type Result<T> = std::result::Result<T, PoliteError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{FetchError, Orchestrator};
pub use strategy::{ParseError, ScrapingStrategy};
pub use url::{CacheKey, Origin};

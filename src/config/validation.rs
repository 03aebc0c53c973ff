use crate::config::types::{CacheBackend, CacheConfig, Config, ScraperConfig, UserAgentConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Longest delay or backoff accepted from configuration (one week)
const MAX_WAIT_SECONDS: f64 = 7.0 * 24.0 * 3600.0;

/// Longest cache freshness window accepted from configuration (ten years)
const MAX_CACHE_TTL_SECONDS: u64 = 10 * 365 * 24 * 3600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates fetch policy configuration
fn validate_scraper_config(config: &ScraperConfig) -> ConfigResult<()> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if base.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    validate_seconds("request_delay_seconds", config.request_delay_seconds)?;
    validate_seconds("max_crawl_delay_seconds", config.max_crawl_delay_seconds)?;
    validate_seconds("backoff_base_seconds", config.backoff_base_seconds)?;
    validate_seconds("backoff_max_seconds", config.backoff_max_seconds)?;

    if config.max_crawl_delay_seconds < config.request_delay_seconds {
        return Err(ConfigError::Validation(format!(
            "max_crawl_delay_seconds ({}) must be >= request_delay_seconds ({})",
            config.max_crawl_delay_seconds, config.request_delay_seconds
        )));
    }

    if config.backoff_max_seconds < config.backoff_base_seconds {
        return Err(ConfigError::Validation(format!(
            "backoff_max_seconds ({}) must be >= backoff_base_seconds ({})",
            config.backoff_max_seconds, config.backoff_base_seconds
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.cache_ttl_seconds > MAX_CACHE_TTL_SECONDS {
        return Err(ConfigError::Validation(format!(
            "cache_ttl_seconds must be at most {}, got {}",
            MAX_CACHE_TTL_SECONDS, config.cache_ttl_seconds
        )));
    }

    if config.request_timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Durations are configured as float seconds, between zero and one week
fn validate_seconds(name: &str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        )));
    }
    if value > MAX_WAIT_SECONDS {
        return Err(ConfigError::Validation(format!(
            "{} must be at most {} seconds, got {}",
            name, MAX_WAIT_SECONDS, value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    // robots.txt product tokens are limited to letters, '-' and '_'
    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only ASCII letters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates response cache configuration
fn validate_cache_config(config: &CacheConfig) -> ConfigResult<()> {
    if config.backend == CacheBackend::Sqlite && config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty for the sqlite backend".to_string(),
        ));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> ConfigResult<()> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

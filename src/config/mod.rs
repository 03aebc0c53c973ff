//! Configuration module for Polite-Fetch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use polite_fetch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("polite-fetch.toml")).unwrap();
//! println!("Requests will be spaced by {}s", config.scraper.request_delay_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheBackend, CacheConfig, Config, ScraperConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;

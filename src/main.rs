//! Polite-Fetch main entry point
//!
//! This is the command-line interface for running the built-in scraping
//! strategies through the polite fetch engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polite_fetch::config::{load_config_with_hash, validate, Config};
use polite_fetch::strategy::{
    PageSummaryStrategy, ScrapingStrategy, SelectorStrategy, TableStrategy, DEFAULT_TABLE_SELECTOR,
};
use polite_fetch::Orchestrator;
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Polite-Fetch: scrape pages without being a nuisance
///
/// Every request honors robots.txt, waits its turn per origin, and is served
/// from the response cache while the cached copy is fresh.
#[derive(Parser, Debug)]
#[command(name = "polite-fetch")]
#[command(version)]
#[command(about = "A polite fetch engine for page scrapers", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the base URL that paths are resolved against
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the title and first heading of a page
    Summary {
        /// Path relative to the base URL, or an absolute URL
        #[arg(default_value = "/")]
        path: String,
    },

    /// Print the text of every element matching a CSS selector
    Select {
        path: String,
        selector: String,
    },

    /// Print the rows of an HTML table as records
    Table {
        path: String,

        /// CSS selector for the table
        #[arg(long, default_value = DEFAULT_TABLE_SELECTOR)]
        selector: String,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,

    /// Remove every cached response
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    match &cli.command {
        Command::Summary { path } => run(&config, &PageSummaryStrategy::new(path.as_str())).await,
        Command::Select { path, selector } => {
            run(&config, &SelectorStrategy::new(path.as_str(), selector.as_str())).await
        }
        Command::Table { path, selector } => {
            run(
                &config,
                &TableStrategy::with_selector(path.as_str(), selector.as_str()),
            )
            .await
        }
        Command::CheckConfig => print_json(&config),
        Command::ClearCache => {
            let orchestrator = Orchestrator::new(&config)?;
            orchestrator
                .clear_cache()
                .context("Failed to clear the response cache")?;
            tracing::info!("Response cache cleared");
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("polite_fetch=info,warn"),
            1 => EnvFilter::new("polite_fetch=debug,info"),
            2 => EnvFilter::new("polite_fetch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, if any, and applies command-line overrides
fn load(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(base_url) = &cli.base_url {
        config.scraper.base_url = base_url.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Scrapes one page with `strategy` and prints the result as JSON
///
/// Ctrl-C cancels any pending wait or request.
async fn run<S: ScrapingStrategy>(config: &Config, strategy: &S) -> Result<()> {
    let orchestrator = Orchestrator::new(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let output = orchestrator
        .scrape_with_cancel(strategy, &cancel)
        .await
        .with_context(|| format!("Failed to scrape {}", strategy.target_url()))?;

    print_json(&output)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

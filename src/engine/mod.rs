//! Fetch engine for Polite-Fetch
//!
//! This module contains the request path shared by every scrape:
//! - HTTP transport seam and the reqwest-backed client
//! - Fetching with bounded retry and exponential backoff
//! - Per-origin rate limiting
//! - The orchestrator that composes cache, robots, pacing, fetch and parse

mod fetcher;
mod orchestrator;
mod scheduler;
mod transport;

pub use fetcher::{FailureCause, FetchAttempt, FetchError, FetchExecutor, RetryPolicy};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use scheduler::{Pacer, RateLimiter};
pub use transport::{
    build_http_client, HttpResponse, HttpTransport, ReqwestTransport, TransportError,
    TransportErrorKind,
};

use thiserror::Error;

/// A wait or request was abandoned because its cancellation token fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

//! HTTP transport seam
//!
//! The fetch executor and the robots gate talk to the network only through
//! [`HttpTransport`], so both can be driven by fake transports in tests.
//! [`ReqwestTransport`] is the production implementation.

use crate::config::{ScraperConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Maximum redirect hops the client follows before giving up
const MAX_REDIRECTS: usize = 10;

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
    /// Final URL after redirects
    pub final_url: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// How a request failed before producing a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request or connection timed out
    Timeout,
    /// The connection was refused or could not be established
    Connect,
    /// The response could not be read or understood (bad body, redirect loop)
    Malformed,
    /// Any other I/O failure while talking to the server
    Other,
}

/// Failure to obtain an HTTP response
#[derive(Debug, Clone)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_redirect() || e.is_decode() || e.is_builder() {
            TransportErrorKind::Malformed
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, e.to_string())
    }
}

/// Issues HTTP GET requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs a GET and returns the response for any status
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// The client identifies itself with the configured user agent, follows up
/// to ten redirects and applies the configured request timeout.
///
/// # Example
///
/// ```no_run
/// use polite_fetch::config::{ScraperConfig, UserAgentConfig};
/// use polite_fetch::engine::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &ScraperConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    scraper: &ScraperConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(scraper.request_timeout())
        .connect_timeout(Duration::from_secs(10).min(scraper.request_timeout()))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        scraper: &ScraperConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, scraper)?))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::from(e)
            } else {
                TransportError::new(TransportErrorKind::Malformed, e.to_string())
            }
        })?;

        Ok(HttpResponse {
            status,
            body,
            final_url,
        })
    }
}

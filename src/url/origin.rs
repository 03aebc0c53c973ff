use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// Scheme + host (+ port) identifying a site for policy and rate-limit scoping
///
/// The port is only kept when it differs from the scheme's default, so
/// `https://example.com` and `https://example.com:443` are the same origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    /// Extracts the origin of an http(s) URL
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use polite_fetch::url::Origin;
    ///
    /// let url = Url::parse("https://EXAMPLE.com:8443/path?q=1").unwrap();
    /// let origin = Origin::from_url(&url).unwrap();
    /// assert_eq!(origin.to_string(), "https://example.com:8443");
    /// ```
    pub fn from_url(url: &Url) -> UrlResult<Self> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                scheme
            )));
        }

        let host = url.host_str().ok_or(UrlError::MissingHost)?;

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_lowercase(),
            port: url.port(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Location of this origin's robots exclusion document
    pub fn robots_url(&self) -> UrlResult<Url> {
        let raw = format!("{}/robots.txt", self);
        Url::parse(&raw).map_err(|e| UrlError::Parse(e.to_string()))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}", self.scheme, self.host, port),
            None => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

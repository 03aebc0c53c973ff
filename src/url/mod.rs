//! URL handling module for Polite-Fetch
//!
//! This module provides origin extraction, cache-key canonicalization and
//! resolution of strategy targets against the configured base URL.

mod normalize;
mod origin;

pub use normalize::{canonical_key, CacheKey};
pub use origin::Origin;

use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a strategy target against the configured base URL
///
/// An absolute http(s) target is used unchanged. Anything else is treated as
/// a path and appended to the base with exactly one `/` between them, so a
/// base of `https://example.com/api/` and a target of `/data` resolve to
/// `https://example.com/api/data`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polite_fetch::url::resolve_target;
///
/// let base = Url::parse("https://en.wikipedia.org").unwrap();
/// let url = resolve_target(&base, "/wiki/Rust").unwrap();
/// assert_eq!(url.as_str(), "https://en.wikipedia.org/wiki/Rust");
/// ```
pub fn resolve_target(base: &Url, target: &str) -> UrlResult<Url> {
    let target = target.trim();
    if target.is_empty() {
        return Err(UrlError::EmptyTarget);
    }

    let resolved = match Url::parse(target) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let root = base.as_str().trim_end_matches('/');
            let joined = format!("{}/{}", root, target.trim_start_matches('/'));
            Url::parse(&joined).map_err(|e| UrlError::Parse(e.to_string()))?
        }
        Err(e) => return Err(UrlError::Parse(e.to_string())),
    };

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            resolved.scheme()
        )));
    }

    if resolved.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(resolved)
}

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Canonicalized request URL used as the response cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an already-canonical key string (e.g. one read back from a store)
    pub fn from_canonical(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalizes a URL into a cache key
///
/// # Canonicalization Steps
///
/// Parsing with `url` already lowercases the scheme and host, resolves dot
/// segments and drops the scheme's default port. On top of that:
///
/// 1. Remove the fragment
/// 2. Empty path becomes `/`
/// 3. Sort query parameters by key, then by value
/// 4. Remove an empty query string (trailing `?`)
///
/// Trailing slashes and repeated slashes in the path are kept as-is, since
/// servers may serve different resources for them.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polite_fetch::url::canonical_key;
///
/// let url = Url::parse("HTTPS://Example.COM:443/data?b=2&a=1#top").unwrap();
/// assert_eq!(canonical_key(&url).as_str(), "https://example.com/data?a=1&b=2");
/// ```
pub fn canonical_key(url: &Url) -> CacheKey {
    let mut url = url.clone();

    url.set_fragment(None);

    if url.path().is_empty() {
        url.set_path("/");
    }

    match url.query() {
        Some("") => url.set_query(None),
        Some(_) => {
            let params = sorted_query_params(&url);
            if params.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut().clear().extend_pairs(params);
            }
        }
        None => {}
    }

    CacheKey(url.to_string())
}

/// Collects query parameters sorted by key, then value
fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> String {
        canonical_key(&Url::parse(raw).unwrap()).to_string()
    }

    #[test]
    fn test_remove_fragment() {
        assert_eq!(key("https://example.com/page#section"), "https://example.com/page");
    }

    #[test]
    fn test_sort_query_params() {
        assert_eq!(
            key("https://example.com/page?b=2&a=1"),
            "https://example.com/page?a=1&b=2"
        );
    }

    #[test]
    fn test_repeated_keys_sorted_by_value() {
        assert_eq!(
            key("https://example.com/page?tag=z&tag=a"),
            "https://example.com/page?tag=a&tag=z"
        );
    }

    #[test]
    fn test_empty_query_removed() {
        assert_eq!(key("https://example.com/page?"), "https://example.com/page");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        assert_eq!(key("https://EXAMPLE.COM/Page"), "https://example.com/Page");
    }

    #[test]
    fn test_default_port_removed() {
        assert_eq!(key("https://example.com:443/a"), "https://example.com/a");
        assert_eq!(key("http://example.com:8080/a"), "http://example.com:8080/a");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        assert_eq!(key("https://example.com"), "https://example.com/");
    }

    #[test]
    fn test_trailing_slash_preserved() {
        assert_ne!(key("https://example.com/page/"), key("https://example.com/page"));
    }

    #[test]
    fn test_dot_segments_resolved() {
        assert_eq!(key("https://example.com/a/../b/./c"), "https://example.com/b/c");
    }

    #[test]
    fn test_equivalent_urls_share_key() {
        assert_eq!(
            key("https://Example.com/data?y=2&x=1#frag"),
            key("https://example.com:443/data?x=1&y=2")
        );
    }
}

//! Scraping strategies
//!
//! A strategy names the page to fetch and turns its body into structured
//! output. Strategies never see the network or the cache, so they can be
//! tested against literal HTML.
//!
//! Built-in strategies:
//! - [`PageSummaryStrategy`] - page title and first heading
//! - [`SelectorStrategy`] - text of every element matching a CSS selector
//! - [`TableStrategy`] - rows of an HTML table keyed by its header cells

mod page;
mod selector;
mod table;

pub use page::{PageSummary, PageSummaryStrategy};
pub use selector::SelectorStrategy;
pub use table::{TableRecord, TableStrategy, DEFAULT_TABLE_SELECTOR};

use scraper::{ElementRef, Selector};
use serde::Serialize;
use thiserror::Error;

/// Failure to extract the expected structure from a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected element not found: {0}")]
    MissingElement(String),

    #[error("invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("malformed content: {0}")]
    Malformed(String),
}

/// Supplies a target and converts its fetched body into structured output
///
/// # Example
///
/// ```
/// use polite_fetch::strategy::{ParseError, ScrapingStrategy};
///
/// struct WordCount;
///
/// impl ScrapingStrategy for WordCount {
///     type Output = usize;
///
///     fn target_url(&self) -> String {
///         "/".to_string()
///     }
///
///     fn parse(&self, content: &str) -> Result<usize, ParseError> {
///         Ok(content.split_whitespace().count())
///     }
/// }
///
/// assert_eq!(WordCount.parse("a b c").unwrap(), 3);
/// ```
pub trait ScrapingStrategy: Send + Sync {
    /// Structured result handed back to the caller
    type Output: Serialize;

    /// Page to fetch: a path relative to the base URL, or an absolute http(s) URL
    fn target_url(&self) -> String;

    /// Converts the fetched body into structured output
    fn parse(&self, content: &str) -> Result<Self::Output, ParseError>;
}

pub(crate) fn parse_selector(raw: &str) -> Result<Selector, ParseError> {
    Selector::parse(raw).map_err(|e| ParseError::InvalidSelector(format!("{}: {}", raw, e)))
}

/// Text content of an element with runs of whitespace collapsed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_element_text_collapses_whitespace() {
        let doc = Html::parse_fragment("<p>  Hello\n  <b>big</b>   world </p>");
        let p = doc.select(&parse_selector("p").unwrap()).next().unwrap();
        assert_eq!(element_text(p), "Hello big world");
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            parse_selector("div[["),
            Err(ParseError::InvalidSelector(_))
        ));
    }
}

//! Page summary strategy: title and first heading

use super::{element_text, parse_selector, ParseError, ScrapingStrategy};
use scraper::Html;
use serde::Serialize;

/// Title and main heading of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    /// Text of `<title>`, if present and non-empty
    pub title: Option<String>,
    /// Text of the first `<h1>`, if present and non-empty
    pub heading: Option<String>,
}

/// Extracts the title and first `<h1>` of a page
#[derive(Debug, Clone)]
pub struct PageSummaryStrategy {
    path: String,
}

impl PageSummaryStrategy {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for PageSummaryStrategy {
    fn default() -> Self {
        Self::new("/")
    }
}

impl ScrapingStrategy for PageSummaryStrategy {
    type Output = PageSummary;

    fn target_url(&self) -> String {
        self.path.clone()
    }

    fn parse(&self, content: &str) -> Result<PageSummary, ParseError> {
        let document = Html::parse_document(content);

        let first_text = |selector: &str| -> Result<Option<String>, ParseError> {
            let selector = parse_selector(selector)?;
            Ok(document
                .select(&selector)
                .next()
                .map(element_text)
                .filter(|s| !s.is_empty()))
        };

        let title = first_text("title")?;
        let heading = first_text("h1")?;

        if title.is_none() && heading.is_none() {
            return Err(ParseError::MissingElement(
                "neither <title> nor <h1> found".to_string(),
            ));
        }

        Ok(PageSummary { title, heading })
    }
}

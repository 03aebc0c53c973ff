//! CSS selector strategy

use super::{element_text, parse_selector, ParseError, ScrapingStrategy};
use scraper::Html;

/// Collects the text of every element matching a CSS selector, in document order
#[derive(Debug, Clone)]
pub struct SelectorStrategy {
    path: String,
    selector: String,
}

impl SelectorStrategy {
    pub fn new(path: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            selector: selector.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }
}

impl ScrapingStrategy for SelectorStrategy {
    type Output = Vec<String>;

    fn target_url(&self) -> String {
        self.path.clone()
    }

    fn parse(&self, content: &str) -> Result<Vec<String>, ParseError> {
        let selector = parse_selector(&self.selector)?;
        let document = Html::parse_document(content);

        let texts: Vec<String> = document.select(&selector).map(element_text).collect();

        if texts.is_empty() {
            return Err(ParseError::MissingElement(format!(
                "no element matches {}",
                self.selector
            )));
        }

        Ok(texts)
    }
}

//! HTML table strategy
//!
//! Header cells (`<th>` of the first row that has no `<td>`) become record
//! keys. A repeated header gets a numeric suffix (`Value`, `Value_2`, ...).
//! Each later row with at least one `<td>` becomes one record. Cells beyond
//! the header width, or under an empty header, are keyed `column_N`
//! (1-based). Footnote markers such as `[1]` or `[note 2]` are removed from
//! every cell.

use super::{element_text, parse_selector, ParseError, ScrapingStrategy};
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;

/// Default table selector, matching Wikipedia data tables
pub const DEFAULT_TABLE_SELECTOR: &str = "table.wikitable";

/// One table row keyed by header text
pub type TableRecord = BTreeMap<String, String>;

/// Extracts the rows of the first table matching a selector
#[derive(Debug, Clone)]
pub struct TableStrategy {
    path: String,
    selector: String,
}

impl TableStrategy {
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_selector(path, DEFAULT_TABLE_SELECTOR)
    }

    pub fn with_selector(path: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            selector: selector.into(),
        }
    }
}

impl ScrapingStrategy for TableStrategy {
    type Output = Vec<TableRecord>;

    fn target_url(&self) -> String {
        self.path.clone()
    }

    fn parse(&self, content: &str) -> Result<Vec<TableRecord>, ParseError> {
        let table_selector = parse_selector(&self.selector)?;
        let row_selector = parse_selector("tr")?;
        let cell_selector = parse_selector("th, td")?;

        let document = Html::parse_document(content);
        let table = document.select(&table_selector).next().ok_or_else(|| {
            ParseError::MissingElement(format!("no table matches {}", self.selector))
        })?;

        let mut headers: Option<Vec<String>> = None;
        let mut records = Vec::new();

        for row in table.select(&row_selector) {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
            let has_data = cells.iter().any(|cell| cell.value().name() == "td");

            if !has_data {
                if headers.is_none() && !cells.is_empty() {
                    headers = Some(header_keys(&cells));
                }
                continue;
            }

            let headers = headers.as_deref().ok_or_else(|| {
                ParseError::Malformed(format!("table {} has data before its header row", self.selector))
            })?;

            let record: TableRecord = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let key = headers
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("column_{}", i + 1));
                    (key, strip_footnotes(&element_text(*cell)))
                })
                .collect();
            records.push(record);
        }

        Ok(records)
    }
}

/// Builds one distinct key per header cell
fn header_keys(cells: &[ElementRef<'_>]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(cells.len());

    for (i, cell) in cells.iter().enumerate() {
        let text = strip_footnotes(&element_text(*cell));
        let base = if text.is_empty() {
            format!("column_{}", i + 1)
        } else {
            text
        };

        let mut key = base.clone();
        let mut n = 1;
        while keys.contains(&key) {
            n += 1;
            key = format!("{}_{}", base, n);
        }
        keys.push(key);
    }

    keys
}

/// Removes bracketed footnote markers and tidies the surrounding whitespace
fn strip_footnotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;

    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// src/models/selectors.rs

//! Scraping rules for a paginated notice board.

use serde::{Deserialize, Serialize};

/// CSS selectors and link rewriting rules for one board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardSelectors {
    /// Listing URL; `{page}` is replaced with the page number
    pub url: String,

    /// Selector for each row/item in the notice list
    pub row_selector: String,

    /// Selector for the title element within a row
    pub title_selector: String,

    /// Selector for the date element within a row
    pub date_selector: String,

    /// Regex applied to the date text; the first match (or its first
    /// capture group) becomes the date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_pattern: Option<String>,

    /// Selector for the link element (defaults to the title element)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_selector: Option<String>,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_attr_name")]
    pub link_attr: String,

    /// Regex applied to the raw link attribute; the first capture group
    /// is substituted for `{1}` in `link_template`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_template: Option<String>,

    /// Selector for the status element within a row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_selector: Option<String>,

    /// Status recorded when the status element is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_status: Option<String>,

    /// Link recorded when no usable link could be extracted
    #[serde(default = "default_missing_link")]
    pub missing_link: String,

    /// Date recorded when the date element is absent
    #[serde(default = "default_missing_date")]
    pub missing_date: String,
}

fn default_attr_name() -> String {
    "href".to_string()
}

fn default_missing_link() -> String {
    "링크 없음".to_string()
}

fn default_missing_date() -> String {
    "날짜 없음".to_string()
}

impl BoardSelectors {
    /// Create selectors for a table-style board.
    pub fn table(
        url: impl Into<String>,
        row: impl Into<String>,
        title: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            row_selector: row.into(),
            title_selector: title.into(),
            date_selector: date.into(),
            date_pattern: None,
            link_selector: None,
            link_attr: default_attr_name(),
            link_pattern: None,
            link_template: None,
            status_selector: None,
            default_status: None,
            missing_link: default_missing_link(),
            missing_date: default_missing_date(),
        }
    }

    /// Rewrite links through a capture pattern.
    pub fn with_link_rewrite(
        mut self,
        pattern: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.link_pattern = Some(pattern.into());
        self.link_template = Some(template.into());
        self
    }

    /// Extract the date with a pattern instead of taking the whole text.
    pub fn with_date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = Some(pattern.into());
        self
    }

    /// Take links from a dedicated element instead of the title.
    pub fn with_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.link_selector = Some(selector.into());
        self
    }

    /// Read a status from each row.
    pub fn with_status(mut self, selector: impl Into<String>, default: impl Into<String>) -> Self {
        self.status_selector = Some(selector.into());
        self.default_status = Some(default.into());
        self
    }

    /// Listing URL for a given page.
    pub fn page_url(&self, page: u32) -> String {
        self.url.replace("{page}", &page.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        let board = BoardSelectors::table("https://example.com/list?p={page}", "tr", "a", "td");
        assert_eq!(board.page_url(3), "https://example.com/list?p=3");
    }

    #[test]
    fn test_defaults_from_toml() {
        let board: BoardSelectors = toml::from_str(
            r#"
            url = "https://example.com"
            row_selector = "tr"
            title_selector = "a"
            date_selector = "td.date"
            "#,
        )
        .unwrap();
        assert_eq!(board.link_attr, "href");
        assert_eq!(board.missing_link, "링크 없음");
        assert!(board.status_selector.is_none());
    }
}

// src/services/boards.rs

//! HTML board provider.
//!
//! Fetches paginated board listings over HTTP and extracts raw records using
//! each source's configured selectors.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{BoardSelectors, CrawlerConfig, PageRange, RawBatch, Source};
use crate::services::Provider;
use crate::utils::{http, normalize_whitespace, resolve_url};

/// Provider backed by plain HTTP requests and CSS selectors.
pub struct BoardProvider {
    client: Client,
    request_delay: Duration,
}

impl BoardProvider {
    /// Create a provider with a fresh HTTP client.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_client(config)?,
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }
}

#[async_trait]
impl Provider for BoardProvider {
    async fn fetch(&self, source: &Source, pages: Option<PageRange>) -> Result<RawBatch> {
        let board = source.board.as_ref().ok_or_else(|| {
            AppError::config(format!("source '{}' has no board selectors", source.key))
        })?;
        let rules = CompiledBoard::compile(board)?;
        let pages: Vec<u32> = pages.map_or_else(|| vec![1], |range| range.pages().collect());

        let mut batch = RawBatch::default();
        let mut fetched = 0;
        let mut last_error = None;

        for (i, page) in pages.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            let url = board.page_url(*page);
            match http::fetch_text(&self.client, &url).await {
                Ok(body) => {
                    let base = Url::parse(&url)?;
                    let rows = rules.parse_page(&body, &base, source.tracks_status, &mut batch);
                    log::debug!("{} page {}: {} rows", source.key, page, rows);
                    fetched += 1;
                }
                Err(e) => {
                    log::warn!("{} page {} failed ({}): {}", source.key, page, url, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if fetched == 0 => Err(AppError::provider(&source.key, e)),
            _ => Ok(batch),
        }
    }
}

/// Parsed selectors for one board.
struct CompiledBoard<'a> {
    rules: &'a BoardSelectors,
    row: Selector,
    title: Selector,
    date: Selector,
    link: Option<Selector>,
    status: Option<Selector>,
    date_pattern: Option<Regex>,
    link_pattern: Option<Regex>,
}

impl<'a> CompiledBoard<'a> {
    fn compile(rules: &'a BoardSelectors) -> Result<Self> {
        Ok(Self {
            rules,
            row: parse_selector(&rules.row_selector)?,
            title: parse_selector(&rules.title_selector)?,
            date: parse_selector(&rules.date_selector)?,
            link: rules.link_selector.as_deref().map(parse_selector).transpose()?,
            status: rules.status_selector.as_deref().map(parse_selector).transpose()?,
            date_pattern: rules.date_pattern.as_deref().map(Regex::new).transpose()?,
            link_pattern: rules.link_pattern.as_deref().map(Regex::new).transpose()?,
        })
    }

    /// Append one listing page's rows to `batch`, returning the row count.
    fn parse_page(&self, body: &str, base: &Url, with_status: bool, batch: &mut RawBatch) -> usize {
        let document = Html::parse_document(body);
        let mut count = 0;

        for row in document.select(&self.row) {
            let Some(title_elem) = row.select(&self.title).next() else {
                continue;
            };
            let title = normalize_whitespace(&element_text(&title_elem));
            if title.is_empty() {
                continue;
            }

            let link = self.extract_link(&row, &title_elem, base);
            let date = self.extract_date(&row);

            if with_status {
                let status = self.extract_status(&row);
                batch.push_with_status(title, link, date, status);
            } else {
                batch.push(title, link, date);
            }
            count += 1;
        }
        count
    }

    fn extract_link(&self, row: &ElementRef, title_elem: &ElementRef, base: &Url) -> String {
        let link_elem = self
            .link
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .unwrap_or(*title_elem);
        let raw = link_elem
            .value()
            .attr(&self.rules.link_attr)
            .unwrap_or("")
            .trim();

        if let (Some(pattern), Some(template)) = (&self.link_pattern, &self.rules.link_template) {
            return pattern
                .captures(raw)
                .and_then(|caps| caps.get(1))
                .map(|id| template.replace("{1}", id.as_str()))
                .unwrap_or_else(|| self.rules.missing_link.clone());
        }

        if raw.is_empty() || raw == "#" || raw.starts_with("javascript:") {
            return self.rules.missing_link.clone();
        }
        resolve_url(base, raw)
    }

    fn extract_date(&self, row: &ElementRef) -> String {
        for elem in row.select(&self.date) {
            let text = normalize_whitespace(&element_text(&elem));
            match &self.date_pattern {
                Some(pattern) => {
                    if let Some(caps) = pattern.captures(&text) {
                        let m = caps.get(1).or_else(|| caps.get(0));
                        if let Some(m) = m {
                            return m.as_str().to_string();
                        }
                    }
                }
                None if !text.is_empty() => return text,
                None => {}
            }
        }
        self.rules.missing_date.clone()
    }

    fn extract_status(&self, row: &ElementRef) -> String {
        self.status
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .map(|elem| normalize_whitespace(&element_text(&elem)))
            .filter(|s| !s.is_empty())
            .or_else(|| self.rules.default_status.clone())
            .unwrap_or_default()
    }
}

fn element_text(elem: &ElementRef) -> String {
    elem.text().collect()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

// src/models/source.rs

//! Notice sources and the registry that orders them.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::BoardSelectors;

/// Inclusive page bounds requested from a provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Iterate the page numbers in order.
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// One external notice-publishing origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    /// Unique key (e.g., "main", "library")
    pub key: String,

    /// Display name
    pub name: String,

    /// Display color (CSS hex)
    pub color: String,

    /// Display icon
    pub icon: String,

    /// Whether records from this source carry an application status
    #[serde(default)]
    pub tracks_status: bool,

    /// Page bounds passed to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<PageRange>,

    /// Scraping rules for the HTML board provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardSelectors>,
}

impl Source {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
            tracks_status: false,
            pages: None,
            board: None,
        }
    }

    pub fn with_status(mut self) -> Self {
        self.tracks_status = true;
        self
    }

    pub fn with_pages(mut self, start: u32, end: u32) -> Self {
        self.pages = Some(PageRange::new(start, end));
        self
    }

    pub fn with_board(mut self, board: BoardSelectors) -> Self {
        self.board = Some(board);
        self
    }

    /// Descriptive metadata exposed to API callers.
    pub fn info(&self) -> SourceInfo {
        SourceInfo {
            key: self.key.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Display metadata for a source.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceInfo {
    pub key: String,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Fixed, ordered table of sources for a running process.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Build a registry, rejecting empty or duplicate keys.
    pub fn new(sources: Vec<Source>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for source in &sources {
            if source.key.trim().is_empty() {
                return Err(AppError::validation("source key is empty"));
            }
            if !seen.insert(source.key.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate source key '{}'",
                    source.key
                )));
            }
        }
        Ok(Self { sources })
    }

    pub fn get(&self, key: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.key == key)
    }

    /// Look up a source, failing on unknown keys.
    pub fn require(&self, key: &str) -> Result<&Source> {
        self.get(key)
            .ok_or_else(|| AppError::UnknownSource(key.to_string()))
    }

    /// Sources in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

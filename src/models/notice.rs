//! Raw provider batches and normalized notices.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Provider output for one source as parallel fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBatch {
    pub titles: Vec<String>,
    pub links: Vec<String>,
    pub dates: Vec<String>,
    /// Present only for sources that track application status
    pub statuses: Option<Vec<String>>,
}

impl RawBatch {
    /// Append one raw record.
    pub fn push(
        &mut self,
        title: impl Into<String>,
        link: impl Into<String>,
        date: impl Into<String>,
    ) {
        self.titles.push(title.into());
        self.links.push(link.into());
        self.dates.push(date.into());
    }

    /// Append one raw record carrying a status.
    pub fn push_with_status(
        &mut self,
        title: impl Into<String>,
        link: impl Into<String>,
        date: impl Into<String>,
        status: impl Into<String>,
    ) {
        self.push(title, link, date);
        self.statuses
            .get_or_insert_with(Vec::new)
            .push(status.into());
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Status for record `i`, if the batch carries one for that index.
    pub fn status(&self, i: usize) -> Option<&str> {
        self.statuses
            .as_ref()
            .and_then(|s| s.get(i))
            .map(String::as_str)
    }

    /// Check that titles, links and dates line up.
    pub fn validate(&self, source_key: &str) -> Result<()> {
        let n = self.titles.len();
        if self.links.len() != n || self.dates.len() != n {
            return Err(AppError::malformed(
                source_key,
                format!(
                    "{} titles, {} links, {} dates",
                    n,
                    self.links.len(),
                    self.dates.len()
                ),
            ));
        }
        Ok(())
    }
}

/// A normalized, cache-resident notice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Positional id `{source}-{ordinal}`, reassigned on every merge
    pub id: String,

    pub title: String,

    /// Full URL, or the source's "no link" sentinel
    pub link: String,

    /// Date as published, loosely formatted
    pub date: String,

    /// Bracketed segments of the title, in order
    #[serde(default)]
    pub tags: Vec<String>,

    pub source: String,
    pub source_name: String,
    pub source_color: String,
    pub source_icon: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Notice {
    /// Logical identity used for deduplication.
    pub fn identity(&self) -> (&str, &str) {
        (&self.title, &self.link)
    }

    /// Overwrite this notice with the fields of a newer observation.
    ///
    /// A missing incoming status keeps the stored one.
    pub fn update_from(&mut self, incoming: Notice) {
        let status = incoming.status.or_else(|| self.status.take());
        *self = Notice { status, ..incoming };
    }
}

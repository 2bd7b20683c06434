// src/models/cache.rs

//! Per-source cache entries and the persisted snapshot layout.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Notice;

/// Cached state for one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceCacheEntry {
    /// Notices in insertion/update order
    #[serde(default, alias = "data")]
    pub records: Vec<Notice>,

    /// Every tag ever seen for the source; never shrinks
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Time of the last successful merge
    #[serde(
        default,
        alias = "last_updated",
        deserialize_with = "deserialize_timestamp"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SourceCacheEntry {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Full cache contents keyed by source, as written to disk.
pub type CacheSnapshot = BTreeMap<String, SourceCacheEntry>;

/// Offset-less layouts accepted when reading older snapshots.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a stored timestamp.
///
/// RFC 3339 is read as-is. A timestamp without an offset is taken as local
/// time, which is how older snapshots recorded it.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;
    Some(
        naive
            .and_local_timezone(Local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    )
}

/// An unreadable timestamp becomes `None` so the entry's records survive.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        let parsed = parse_timestamp(&raw);
        if parsed.is_none() {
            log::warn!("Ignoring unreadable timestamp '{}'", raw);
        }
        parsed
    }))
}

// src/pipeline/process.rs

//! Raw batch normalization.
//!
//! Turns a provider's parallel fields into [`Notice`] records: provisional
//! ids, bracketed title tags, and denormalized source metadata.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Notice, RawBatch, Source};

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("tag pattern is a valid regex"));

/// A processed batch ready for merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedBatch {
    pub notices: Vec<Notice>,
    /// Union of the batch's tags
    pub tags: BTreeSet<String>,
}

/// Extract `[...]` segments from a title, left to right, duplicates kept.
pub fn extract_tags(title: &str) -> Vec<String> {
    TAG_PATTERN
        .captures_iter(title)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Normalize a validated raw batch for a source.
///
/// Dates are passed through untouched; ids are `{key}-{i+1}` until the
/// merge reassigns them.
pub fn process_batch(batch: &RawBatch, source: &Source) -> ProcessedBatch {
    let notices: Vec<Notice> = batch
        .titles
        .iter()
        .zip(&batch.links)
        .zip(&batch.dates)
        .enumerate()
        .map(|(i, ((title, link), date))| Notice {
            id: format!("{}-{}", source.key, i + 1),
            title: title.clone(),
            link: link.clone(),
            date: date.clone(),
            tags: extract_tags(title),
            source: source.key.clone(),
            source_name: source.name.clone(),
            source_color: source.color.clone(),
            source_icon: source.icon.clone(),
            status: batch.status(i).map(String::from),
        })
        .collect();

    let tags = notices
        .iter()
        .flat_map(|n| n.tags.iter().cloned())
        .collect();

    ProcessedBatch { notices, tags }
}

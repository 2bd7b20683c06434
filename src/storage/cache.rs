//! In-memory notice cache shared by readers and the refresh loop.
//!
//! One lock guards the whole cache. It is only held for in-memory work,
//! never across a provider call, so a reader sees each source either
//! before or after a merge.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{CacheSnapshot, Notice, SourceCacheEntry, SourceRegistry};
use crate::pipeline::merge::{MergeOutcome, assign_ids, merge_notices, merge_tags};
use crate::pipeline::process::ProcessedBatch;

/// Union of every source's cached records.
#[derive(Debug, Clone, Default)]
pub struct CombinedView {
    /// Records in registry order, then per-source order
    pub notices: Vec<Notice>,
    pub tags: BTreeSet<String>,
    pub counts: BTreeMap<String, usize>,
}

/// Sole owner of the per-source cache entries.
pub struct CacheStore {
    registry: Arc<SourceRegistry>,
    entries: Mutex<BTreeMap<String, SourceCacheEntry>>,
}

impl CacheStore {
    /// Create a store with an empty entry for every registered source.
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        let entries = registry
            .keys()
            .map(|key| (key.to_string(), SourceCacheEntry::default()))
            .collect();
        Self {
            registry,
            entries: Mutex::new(entries),
        }
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Snapshot of one source's entry.
    pub async fn read(&self, source_key: &str) -> Result<SourceCacheEntry> {
        self.entries
            .lock()
            .await
            .get(source_key)
            .cloned()
            .ok_or_else(|| AppError::UnknownSource(source_key.to_string()))
    }

    /// All records across sources with their tags unioned.
    pub async fn read_all(&self) -> CombinedView {
        let entries = self.entries.lock().await;
        let mut view = CombinedView::default();
        for key in self.registry.keys() {
            let Some(entry) = entries.get(key) else {
                continue;
            };
            view.notices.extend(entry.records.iter().cloned());
            view.tags.extend(entry.tags.iter().cloned());
            view.counts.insert(key.to_string(), entry.len());
        }
        view
    }

    /// Atomically replace one source's entry.
    pub async fn apply_merge(
        &self,
        source_key: &str,
        records: Vec<Notice>,
        tags: BTreeSet<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().await;
        replace_entry(&mut entries, source_key, records, tags, timestamp)
    }

    /// Merge a processed batch against the current entry and store the result.
    ///
    /// This is [`apply_merge`](Self::apply_merge) with the merge computed
    /// inside the same lock acquisition, so the read, merge, id reassignment
    /// and write cannot interleave with another writer.
    pub async fn merge_batch(
        &self,
        source_key: &str,
        batch: ProcessedBatch,
        timestamp: DateTime<Utc>,
    ) -> Result<MergeOutcome> {
        let source = self.registry.require(source_key)?;
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get(source_key)
            .ok_or_else(|| AppError::UnknownSource(source_key.to_string()))?;

        let mut outcome = merge_notices(entry.records.clone(), batch.notices, source);
        assign_ids(&mut outcome.notices, source_key);
        let tags = merge_tags(&entry.tags, &batch.tags);

        replace_entry(
            &mut entries,
            source_key,
            outcome.notices.clone(),
            tags,
            timestamp,
        )?;
        Ok(outcome)
    }

    /// Copy of the whole cache for persistence.
    pub async fn snapshot(&self) -> CacheSnapshot {
        self.entries.lock().await.clone()
    }

    /// Load persisted entries for registered sources; others are ignored.
    ///
    /// Returns the number of sources restored.
    pub async fn restore(&self, snapshot: CacheSnapshot) -> usize {
        let mut entries = self.entries.lock().await;
        let mut restored = 0;
        for (key, entry) in snapshot {
            if let Some(slot) = entries.get_mut(&key) {
                *slot = entry;
                restored += 1;
            } else {
                log::debug!("Ignoring snapshot entry for unknown source '{}'", key);
            }
        }
        restored
    }
}

/// Swap in a source's new entry. Callers hold the cache lock.
fn replace_entry(
    entries: &mut BTreeMap<String, SourceCacheEntry>,
    source_key: &str,
    records: Vec<Notice>,
    tags: BTreeSet<String>,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    let entry = entries
        .get_mut(source_key)
        .ok_or_else(|| AppError::UnknownSource(source_key.to_string()))?;
    *entry = SourceCacheEntry {
        records,
        tags,
        last_updated: Some(timestamp),
    };
    Ok(())
}

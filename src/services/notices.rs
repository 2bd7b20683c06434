// src/services/notices.rs

//! Read API over the notice cache.
//!
//! Response types serialize with camelCase names so an HTTP layer can return
//! them as-is.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, Notice, SourceInfo, SourceRegistry};
use crate::pipeline::{CrawlOrchestrator, CycleReport, RefreshScheduler};
use crate::services::{BoardProvider, Provider, ProviderFactory, ProviderSupervisor};
use crate::storage::{CacheStore, SnapshotFileInfo, SnapshotStore};
use crate::utils::date_sort_key;

/// Every cached notice, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllNotices {
    pub notices: Vec<Notice>,
    pub tags: Vec<String>,
    pub sources: Vec<SourceInfo>,
    pub source_counts: BTreeMap<String, usize>,
}

/// Per-source cache state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub key: String,
    pub name: String,
    pub count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub sources: Vec<SourceStatus>,
    pub snapshot_file: SnapshotFileInfo,
    pub update_interval_secs: u64,
}

/// Facade used by request handlers and the CLI.
#[derive(Clone)]
pub struct NoticeService {
    scheduler: Arc<RefreshScheduler>,
}

impl NoticeService {
    pub fn new(scheduler: Arc<RefreshScheduler>) -> Self {
        Self { scheduler }
    }

    /// Wire the service with the HTML board provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let crawler = config.crawler.clone();
        Self::with_factory(config, move || -> Result<Arc<dyn Provider>> {
            Ok(Arc::new(BoardProvider::new(&crawler)?))
        })
    }

    /// Wire the service with a caller-supplied provider factory.
    pub fn with_factory(config: &Config, factory: impl ProviderFactory + 'static) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(SourceRegistry::new(config.sources.clone())?);
        let store = Arc::new(CacheStore::new(registry));
        let supervisor = Arc::new(ProviderSupervisor::new(factory));
        let orchestrator = CrawlOrchestrator::new(supervisor, config.refresh.max_attempts);
        let snapshots = SnapshotStore::new(&config.storage.snapshot_path);
        let scheduler =
            RefreshScheduler::new(store, orchestrator, snapshots, config.refresh.clone());

        Ok(Self::new(Arc::new(scheduler)))
    }

    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.scheduler
    }

    fn store(&self) -> &CacheStore {
        self.scheduler.store()
    }

    pub fn list_sources(&self) -> Vec<SourceInfo> {
        self.store().registry().iter().map(|s| s.info()).collect()
    }

    /// All notices sorted by [`date_sort_key`], descending.
    ///
    /// The sort is stable, so records sharing a key keep registry order.
    pub async fn get_all(&self) -> AllNotices {
        let view = self.store().read_all().await;
        let mut notices = view.notices;
        notices.sort_by_cached_key(|n| std::cmp::Reverse(date_sort_key(&n.date)));

        AllNotices {
            notices,
            tags: view.tags.into_iter().collect(),
            sources: self.list_sources(),
            source_counts: view.counts,
        }
    }

    pub async fn force_refresh(&self) -> CycleReport {
        self.scheduler.force_refresh().await
    }

    pub async fn get_status(&self) -> StatusReport {
        let store = self.store();
        let mut sources = Vec::with_capacity(store.registry().len());
        for source in store.registry().iter() {
            let entry = store.read(&source.key).await.unwrap_or_default();
            sources.push(SourceStatus {
                key: source.key.clone(),
                name: source.name.clone(),
                count: entry.len(),
                last_updated: entry.last_updated,
            });
        }

        StatusReport {
            sources,
            snapshot_file: self.scheduler.snapshots().file_info().await,
            update_interval_secs: self.scheduler.config().interval_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::models::{PageRange, RawBatch, Source};
    use crate::pipeline::process_batch;

    struct EmptyProvider;

    #[async_trait]
    impl Provider for EmptyProvider {
        async fn fetch(&self, _source: &Source, _pages: Option<PageRange>) -> Result<RawBatch> {
            Ok(RawBatch::default())
        }
    }

    fn service(dir: &TempDir) -> NoticeService {
        let mut config = Config::default();
        config.storage.snapshot_path = dir.path().join("cache.json");
        config.sources = vec![
            Source::new("main", "메인공지", "#1a73e8", "🏫"),
            Source::new("library", "도서관", "#43a047", "📚"),
        ];
        NoticeService::with_factory(&config, || -> Result<Arc<dyn Provider>> {
            Ok(Arc::new(EmptyProvider))
        })
        .unwrap()
    }

    async fn seed(service: &NoticeService, key: &str, rows: &[(&str, &str)]) {
        let store = service.scheduler().store();
        let mut raw = RawBatch::default();
        for (title, date) in rows {
            raw.push(*title, format!("https://example.com/{title}"), *date);
        }
        let batch = process_batch(&raw, store.registry().get(key).unwrap());
        store.merge_batch(key, batch, Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_all_sorts_mixed_date_formats() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp);
        seed(&service, "main", &[("A", "2025.03.01"), ("C", "날짜 없음")]).await;
        seed(&service, "library", &[("B", "2025-03-02")]).await;

        let all = service.get_all().await;
        let titles: Vec<_> = all.notices.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
        assert_eq!(all.source_counts["main"], 2);
        assert_eq!(all.source_counts["library"], 1);
        assert_eq!(all.sources.len(), 2);
    }

    #[tokio::test]
    async fn test_get_all_tags_sorted_and_unioned() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp);
        seed(&service, "main", &[("[학사] A", "2025-01-01")]).await;
        seed(&service, "library", &[("[공지][학사] B", "2025-01-02")]).await;

        let tags = service.get_all().await.tags;
        let sorted: BTreeSet<_> = tags.iter().cloned().collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags, sorted.into_iter().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_get_status_reports_sources_and_file() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp);
        seed(&service, "main", &[("A", "2025-01-01")]).await;

        let status = service.get_status().await;
        assert_eq!(status.sources.len(), 2);
        assert_eq!(status.sources[0].key, "main");
        assert_eq!(status.sources[0].count, 1);
        assert!(status.sources[0].last_updated.is_some());
        assert!(status.sources[1].last_updated.is_none());
        assert!(!status.snapshot_file.exists);
        assert_eq!(status.update_interval_secs, 3000);

        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("snapshotFile").is_some());
        assert!(json.get("updateIntervalSecs").is_some());
    }

    #[tokio::test]
    async fn test_force_refresh_with_empty_batches() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp);

        let report = service.force_refresh().await;
        assert_eq!(report.succeeded, 2);
        assert!(report.saved);
        assert!(service.get_status().await.snapshot_file.exists);
    }

    #[test]
    fn test_with_factory_rejects_invalid_config() {
        let mut config = Config::default();
        config.sources.clear();
        let result = NoticeService::with_factory(&config, || -> Result<Arc<dyn Provider>> {
            Ok(Arc::new(EmptyProvider))
        });
        assert!(result.is_err());
    }
}

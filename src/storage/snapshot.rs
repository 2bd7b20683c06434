//! Snapshot persistence for the notice cache.
//!
//! The snapshot is one pretty-printed JSON object mapping source keys to
//! `{records, tags, lastUpdated}`. Writes go to a temp file and are renamed
//! into place.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CacheSnapshot, SourceCacheEntry};

/// Metadata about the snapshot file on disk.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFileInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Reads and writes cache snapshots at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a complete snapshot.
    pub async fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write_bytes(&bytes).await?;
        log::info!("Snapshot saved: {}", self.path.display());
        Ok(())
    }

    /// Save, logging instead of propagating failures.
    pub async fn save_logged(&self, snapshot: &CacheSnapshot) -> bool {
        match self.save(snapshot).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Snapshot save failed ({}): {}", self.path.display(), e);
                false
            }
        }
    }

    /// Read the snapshot if present and well-formed.
    ///
    /// Unknown keys are kept for the caller to ignore; individual entries
    /// that fail to decode are dropped with a warning.
    pub async fn load(&self) -> Option<CacheSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Snapshot load failed ({}): {}", self.path.display(), e);
                return None;
            }
        };

        let object: Map<String, Value> = match serde_json::from_slice(&bytes) {
            Ok(object) => object,
            Err(e) => {
                log::warn!("Snapshot is malformed ({}): {}", self.path.display(), e);
                return None;
            }
        };

        let mut snapshot = CacheSnapshot::new();
        for (key, value) in object {
            match serde_json::from_value::<SourceCacheEntry>(value) {
                Ok(entry) => {
                    snapshot.insert(key, entry);
                }
                Err(e) => log::warn!("Skipping snapshot entry '{}': {}", key, e),
            }
        }

        log::info!("Snapshot loaded: {}", self.path.display());
        Some(snapshot)
    }

    /// Existence, size and modification time of the snapshot file.
    pub async fn file_info(&self) -> SnapshotFileInfo {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => SnapshotFileInfo {
                path: self.path.clone(),
                exists: true,
                size: meta.len(),
                last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
            },
            Err(_) => SnapshotFileInfo {
                path: self.path.clone(),
                exists: false,
                size: 0,
                last_modified: None,
            },
        }
    }

    /// Replace the snapshot file via a sibling `.tmp` file and a rename.
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(AppError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Notice;
    use tempfile::TempDir;

    fn sample_entry() -> SourceCacheEntry {
        SourceCacheEntry {
            records: vec![Notice {
                id: "main-1".to_string(),
                title: "[학사] 수강신청 안내".to_string(),
                link: "https://example.com/1".to_string(),
                date: "2025.03.01".to_string(),
                tags: vec!["학사".to_string()],
                source: "main".to_string(),
                source_name: "메인공지".to_string(),
                source_color: "#1a73e8".to_string(),
                source_icon: "🏫".to_string(),
                status: None,
            }],
            tags: ["학사".to_string()].into_iter().collect(),
            last_updated: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("cache.json"));

        let mut snapshot = CacheSnapshot::new();
        snapshot.insert("main".to_string(), sample_entry());
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, snapshot);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("수강신청"));
        assert!(text.contains("\"lastUpdated\""));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("absent.json"));
        assert!(store.load().await.is_none());

        let info = store.file_info().await;
        assert!(!info.exists);
        assert_eq!(info.size, 0);
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(SnapshotStore::new(&path).load().await.is_none());

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(SnapshotStore::new(&path).load().await.is_none());
    }

    #[tokio::test]
    async fn test_load_skips_bad_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{
                "main": {"records": [], "tags": ["a"], "lastUpdated": null},
                "library": {"records": "oops"},
                "version": 3
            }"#,
        )
        .unwrap();

        let loaded = SnapshotStore::new(&path).load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded["main"].tags.contains("a"));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("nested/dir/cache.json"));
        assert!(store.save_logged(&CacheSnapshot::new()).await);

        let info = store.file_info().await;
        assert!(info.exists);
        assert!(info.size > 0);
        assert!(info.last_modified.is_some());
    }
}

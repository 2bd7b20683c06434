// src/pipeline/refresh.rs

//! Refresh cycles over every registered source.
//!
//! A cycle walks the registry in order, crawls each source outside the cache
//! lock and merges successes into the [`CacheStore`]. Failures never abort the
//! cycle. The snapshot is written once at the end of a cycle that merged
//! anything.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::models::{RefreshConfig, Source};
use crate::pipeline::crawl::CrawlOrchestrator;
use crate::pipeline::merge::StatusChange;
use crate::storage::{CacheStore, SnapshotStore};

/// Result of refreshing one source within a cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "outcome",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum SourceOutcome {
    Merged {
        source: String,
        total: usize,
        new_count: usize,
        updated_count: usize,
        status_changes: Vec<StatusChange>,
    },
    Failed {
        source: String,
        error: String,
    },
}

impl SourceOutcome {
    pub fn source(&self) -> &str {
        match self {
            Self::Merged { source, .. } | Self::Failed { source, .. } => source,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Aggregate report for one refresh cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<SourceOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub new_count: usize,
    pub status_changed_count: usize,
    /// Times the provider was recreated after a failure streak
    pub recreations: usize,
    pub saved: bool,
}

impl CycleReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            outcomes: Vec::new(),
            succeeded: 0,
            failed: 0,
            new_count: 0,
            status_changed_count: 0,
            recreations: 0,
            saved: false,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn record(&mut self, outcome: SourceOutcome) {
        match &outcome {
            SourceOutcome::Merged {
                new_count,
                status_changes,
                ..
            } => {
                self.succeeded += 1;
                self.new_count += new_count;
                self.status_changed_count += status_changes.len();
            }
            SourceOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Runs refresh cycles on demand and in the background.
pub struct RefreshScheduler {
    store: Arc<CacheStore>,
    orchestrator: CrawlOrchestrator,
    snapshots: SnapshotStore,
    config: RefreshConfig,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<CacheStore>,
        orchestrator: CrawlOrchestrator,
        snapshots: SnapshotStore,
        config: RefreshConfig,
    ) -> Self {
        Self {
            store,
            orchestrator,
            snapshots,
            config,
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Seed the cache from the snapshot file, if one is usable.
    ///
    /// Returns `true` when at least one source was restored.
    pub async fn restore_snapshot(&self) -> bool {
        match self.snapshots.load().await {
            Some(snapshot) => {
                let restored = self.store.restore(snapshot).await;
                log::info!("Restored {} sources from snapshot", restored);
                restored > 0
            }
            None => {
                log::info!("No usable snapshot, starting with an empty cache");
                false
            }
        }
    }

    /// Run one full cycle over the registry.
    pub async fn run_cycle(&self) -> CycleReport {
        let registry = Arc::clone(self.store.registry());
        let mut report = CycleReport::new(Utc::now());
        let mut consecutive_failures = 0u32;

        log::info!("Cache refresh started ({} sources)", registry.len());

        for source in registry.iter() {
            let outcome = self.refresh_source(source).await;
            if outcome.is_merged() {
                consecutive_failures = 0;
            } else {
                consecutive_failures += 1;
            }
            report.record(outcome);

            if consecutive_failures >= self.config.failure_threshold {
                log::warn!(
                    "{} consecutive failures, recreating provider...",
                    consecutive_failures
                );
                if let Err(e) = self.orchestrator.supervisor().invalidate().await {
                    log::error!("Provider recreation failed: {}", e);
                }
                report.recreations += 1;
                consecutive_failures = 0;
            }
        }

        if report.succeeded > 0 {
            let snapshot = self.store.snapshot().await;
            report.saved = self.snapshots.save_logged(&snapshot).await;
        }
        report.finished_at = Utc::now();

        if report.status_changed_count > 0 {
            log::info!(
                "Cache refresh complete ({}/{} sources, {} new, {} status changes)",
                report.succeeded,
                report.total(),
                report.new_count,
                report.status_changed_count
            );
        } else {
            log::info!(
                "Cache refresh complete ({}/{} sources, {} new)",
                report.succeeded,
                report.total(),
                report.new_count
            );
        }
        report
    }

    /// Run exactly one cycle for an explicit caller.
    ///
    /// Independent of the background timer; the two may overlap.
    pub async fn force_refresh(&self) -> CycleReport {
        log::info!("Forced refresh requested");
        self.run_cycle().await
    }

    async fn refresh_source(&self, source: &Source) -> SourceOutcome {
        let batch = match self.orchestrator.refresh_one(source).await {
            Ok(batch) => batch,
            Err(e) => {
                log::error!("{} update failed: {}", source.key, e);
                return SourceOutcome::Failed {
                    source: source.key.clone(),
                    error: e.to_string(),
                };
            }
        };

        match self.store.merge_batch(&source.key, batch, Utc::now()).await {
            Ok(merged) => {
                let total = merged.notices.len();
                if source.tracks_status && merged.status_changed_count() > 0 {
                    log::info!(
                        "{} cache updated: {} total ({} new, {} status changes)",
                        source.name,
                        total,
                        merged.new_count,
                        merged.status_changed_count()
                    );
                } else {
                    log::info!(
                        "{} cache updated: {} total ({} new)",
                        source.name,
                        total,
                        merged.new_count
                    );
                }
                SourceOutcome::Merged {
                    source: source.key.clone(),
                    total,
                    new_count: merged.new_count,
                    updated_count: merged.updated_count,
                    status_changes: merged.status_changes,
                }
            }
            Err(e) => {
                log::error!("{} merge failed: {}", source.key, e);
                SourceOutcome::Failed {
                    source: source.key.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Background loop: first cycle after the startup delay, then one per
    /// interval until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "Background refresh started (interval: {}s)",
            self.config.interval_secs
        );

        if !wait_or_shutdown(self.config.startup_delay(), &mut shutdown).await {
            loop {
                self.run_cycle().await;
                if wait_or_shutdown(self.config.interval(), &mut shutdown).await {
                    break;
                }
            }
        }

        log::info!("Background refresh received shutdown signal");
        self.shutdown().await;
    }

    /// Spawn [`run`](Self::run) onto the runtime.
    pub fn spawn(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(shutdown))
    }

    /// Run the background loop until `signal` resolves, then stop it.
    ///
    /// A failing signal is logged and treated as a shutdown request so the
    /// final save still happens.
    pub async fn run_until<F>(self: &Arc<Self>, signal: F)
    where
        F: Future<Output = std::io::Result<()>>,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = self.spawn(shutdown_rx);

        match signal.await {
            Ok(()) => log::info!("Shutdown signal received"),
            Err(e) => log::error!("Shutdown signal failed ({}), shutting down...", e),
        }
        let _ = shutdown_tx.send(true);

        if let Err(e) = handle.await {
            log::error!("Refresh task ended abnormally: {}", e);
        }
    }

    /// Final save and provider release.
    pub async fn shutdown(&self) {
        let snapshot = self.store.snapshot().await;
        self.snapshots.save_logged(&snapshot).await;
        self.orchestrator.supervisor().close().await;
        log::info!("Shutdown complete");
    }
}

/// Sleep for `duration`, returning `true` early if shutdown is requested.
async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    let deadline = sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
            _ = &mut deadline => return false,
        }
    }
}

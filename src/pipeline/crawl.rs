// src/pipeline/crawl.rs

//! Single-source refresh with bounded retries.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Source;
use crate::pipeline::process::{ProcessedBatch, process_batch};
use crate::services::ProviderSupervisor;

/// Message fragments that indicate a lost provider session.
const SESSION_MARKERS: &[&str] = &["invalid session", "session", "disconnected"];

/// Coarse classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The provider's session or connection died; recreate before retrying.
    Session,
    /// Anything else; retry as-is.
    Other,
}

/// Classify a failure by its message.
///
/// This is a substring heuristic: any message mentioning a session or a
/// disconnect counts as a session failure.
pub fn classify_failure(message: &str) -> FailureKind {
    let message = message.to_lowercase();
    if SESSION_MARKERS.iter().any(|m| message.contains(m)) {
        FailureKind::Session
    } else {
        FailureKind::Other
    }
}

/// Drives one source's provider call, retrying and recovering sessions.
pub struct CrawlOrchestrator {
    supervisor: Arc<ProviderSupervisor>,
    max_attempts: u32,
}

impl CrawlOrchestrator {
    pub fn new(supervisor: Arc<ProviderSupervisor>, max_attempts: u32) -> Self {
        Self {
            supervisor,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn supervisor(&self) -> &Arc<ProviderSupervisor> {
        &self.supervisor
    }

    /// Fetch and process one source.
    ///
    /// Never touches the cache; on failure the last error is returned after
    /// `max_attempts` tries.
    pub async fn refresh_one(&self, source: &Source) -> Result<ProcessedBatch> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match self.attempt(source).await {
                Ok(batch) => return Ok(batch),
                Err(e) => {
                    log::error!(
                        "{} crawl failed (attempt {}/{}): {}",
                        source.key,
                        attempt,
                        self.max_attempts,
                        e
                    );

                    if classify_failure(&e.to_string()) == FailureKind::Session {
                        log::info!("Session failure detected, recreating provider...");
                        if let Err(re) = self.supervisor.invalidate().await {
                            log::error!("Provider recreation failed: {}", re);
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::provider(&source.key, "no attempts made")))
    }

    async fn attempt(&self, source: &Source) -> Result<ProcessedBatch> {
        let provider = self.supervisor.acquire().await?;
        let batch = provider.fetch(source, source.pages).await?;
        batch.validate(&source.key)?;
        Ok(process_batch(&batch, source))
    }
}

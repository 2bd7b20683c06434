// src/services/provider.rs

//! Provider contract and the supervised provider handle.
//!
//! A provider fetches raw batches for one source at a time. The supervisor
//! owns the single live provider instance behind its own lock, separate from
//! the cache lock, and replaces it when a session is lost.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{PageRange, RawBatch, Source};

/// Fetches raw notice batches for a source.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Fetch one batch for `source`, optionally bounded to `pages`.
    async fn fetch(&self, source: &Source, pages: Option<PageRange>) -> Result<RawBatch>;

    /// Release the provider's session. Errors are swallowed.
    async fn close(&self) {}
}

/// Builds fresh provider instances.
pub trait ProviderFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn Provider>>;
}

impl<F> ProviderFactory for F
where
    F: Fn() -> Result<Arc<dyn Provider>> + Send + Sync,
{
    fn create(&self) -> Result<Arc<dyn Provider>> {
        self()
    }
}

/// Lazily created, replaceable provider singleton.
pub struct ProviderSupervisor {
    factory: Box<dyn ProviderFactory>,
    current: Mutex<Option<Arc<dyn Provider>>>,
}

impl ProviderSupervisor {
    pub fn new(factory: impl ProviderFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            current: Mutex::new(None),
        }
    }

    /// Return the live provider, creating one if none exists.
    ///
    /// Callers use the handle outside the supervisor lock.
    pub async fn acquire(&self) -> Result<Arc<dyn Provider>> {
        let mut current = self.current.lock().await;
        if let Some(provider) = current.as_ref() {
            return Ok(Arc::clone(provider));
        }
        let provider = self.factory.create()?;
        *current = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Close the live provider and replace it with a fresh one.
    ///
    /// In-flight calls on the old handle are left to finish or fail.
    pub async fn invalidate(&self) -> Result<()> {
        let mut current = self.current.lock().await;
        if let Some(old) = current.take() {
            old.close().await;
        }
        *current = Some(self.factory.create()?);
        log::info!("Provider recreated");
        Ok(())
    }

    /// Close the live provider without replacing it.
    pub async fn close(&self) {
        let mut current = self.current.lock().await;
        if let Some(old) = current.take() {
            old.close().await;
            log::info!("Provider closed");
        }
    }
}

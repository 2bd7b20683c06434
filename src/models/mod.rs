// src/models/mod.rs

//! Domain models for the aggregator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod cache;
mod config;
mod notice;
mod selectors;
mod source;

// Re-export all public types
pub use cache::{CacheSnapshot, SourceCacheEntry};
pub use config::{Config, CrawlerConfig, RefreshConfig, StorageConfig};
pub use notice::{Notice, RawBatch};
pub use selectors::BoardSelectors;
pub use source::{PageRange, Source, SourceInfo, SourceRegistry};

//! Refresh pipeline.
//!
//! - `process`: raw provider batches to notices with tags
//! - `merge`: identity-based merge into a source's history
//! - `crawl`: one source's provider call with retries
//! - `refresh`: full cycles over the registry, on demand or in the background

pub mod crawl;
pub mod merge;
pub mod process;
pub mod refresh;

pub use crawl::{CrawlOrchestrator, FailureKind, classify_failure};
pub use merge::{MergeOutcome, StatusChange, merge_notices};
pub use process::{ProcessedBatch, extract_tags, process_batch};
pub use refresh::{CycleReport, RefreshScheduler, SourceOutcome};

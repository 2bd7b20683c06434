//! Cache ownership and snapshot persistence.
//!
//! ```text
//! CacheStore     in-memory entries, one lock for the whole cache
//! SnapshotStore  cache.json, rewritten atomically after each useful cycle
//! ```

pub mod cache;
pub mod snapshot;

pub use cache::{CacheStore, CombinedView};
pub use snapshot::{SnapshotFileInfo, SnapshotStore};

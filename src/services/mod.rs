//! Service layer for the aggregator.
//!
//! - Provider contract and supervised provider handle (`ProviderSupervisor`)
//! - HTML board provider (`BoardProvider`)
//! - Read API over the cache (`NoticeService`)

mod boards;
mod notices;
mod provider;

pub use boards::BoardProvider;
pub use notices::{AllNotices, NoticeService, SourceStatus, StatusReport};
pub use provider::{Provider, ProviderFactory, ProviderSupervisor};

// src/lib.rs

//! Campus notice aggregator library.
//!
//! Crawls configured notice boards, merges each batch into a per-source
//! history and serves the combined, persisted cache.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
pub use services::NoticeService;

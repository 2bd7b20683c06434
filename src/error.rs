// src/error.rs

//! Unified error handling for the aggregator.

use std::fmt;

use thiserror::Error;

/// Result type alias for aggregator operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression failed to compile
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Source key not present in the registry
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Provider failed to produce a batch for a source
    #[error("Provider error for {source_key}: {message}")]
    Provider { source_key: String, message: String },

    /// Provider returned parallel fields of unequal length
    #[error("Malformed batch for {source_key}: {message}")]
    MalformedBatch { source_key: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a provider error for a source.
    pub fn provider(source_key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Provider {
            source_key: source_key.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed batch error for a source.
    pub fn malformed(source_key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedBatch {
            source_key: source_key.into(),
            message: message.to_string(),
        }
    }
}

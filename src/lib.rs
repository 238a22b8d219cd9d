//! Homewatch: a listing watcher
//!
//! This crate crawls paginated real-estate listing sources, reconciles each
//! listing against a persistent store, and dispatches rate-limited webhook
//! notifications for new and changed listings.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod notify;
pub mod store;

use thiserror::Error;

/// Main error type for homewatch operations
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extractor error for source {source_name}: {source}")]
    Extract {
        source_name: String,
        source: extract::ExtractError,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] notify::NotifyError),

    #[error("Unknown source kind: {0}")]
    UnknownSourceKind(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for homewatch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{Extractor, FieldMap, SearchCriteria, SummaryPage};
pub use store::{ChangeEntry, ListingRecord, ReconcileResult};

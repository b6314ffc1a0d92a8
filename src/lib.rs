//! Statute-Loom: an incremental legal-code mirror
//!
//! This crate crawls a public legal-code website and reconstructs its
//! hierarchy (Parts → Titles → Chapters → Sections with full text) into a
//! single JSON snapshot that doubles as the resume checkpoint. Structural
//! levels are re-discovered every run; section bodies are fetched only when
//! the persisted copy is incomplete.

pub mod config;
pub mod document;
pub mod extract;
pub mod fetch;
pub mod label;
pub mod state;
pub mod stats;
pub mod store;
pub mod walker;

use thiserror::Error;

/// Main error type for Statute-Loom operations
#[derive(Debug, Error)]
pub enum LoomError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

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

/// Errors raised while navigating to a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },
}

/// Errors raised while extracting records from a fetched page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Expected element never appeared: {selector}")]
    SelectorNotFound { selector: String },

    #[error("Expansion of title {title} never yielded children")]
    ExpansionTimeout { title: String },
}

/// Errors raised by the snapshot store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for Statute-Loom operations
pub type Result<T> = std::result::Result<T, LoomError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use document::{Chapter, Document, Part, Section, Title};
pub use state::NodeState;
pub use stats::CrawlStats;
pub use store::SnapshotStore;
pub use walker::Walker;

//! Snapmirror: a Wayback Machine site mirroring tool
//!
//! This crate downloads a website as it existed in a specific archived
//! snapshot, reconstructing the site's directory structure on local storage
//! and following same-domain links to a bounded depth.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for snapmirror operations
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid snapshot timestamp: {0} (expected YYYYMMDDHHMMSS)")]
    InvalidTimestamp(String),

    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        source: std::io::Error,
    },

    #[error("Browser engine error: {0}")]
    Browser(String),

    #[error("Browser support not compiled in (rebuild with --features browser)")]
    BrowserUnavailable,

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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for snapmirror operations
pub type Result<T> = std::result::Result<T, SnapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use archive::CaptureAddress;
pub use config::Config;
pub use self::url::{extract_domain, normalize_url, same_site};

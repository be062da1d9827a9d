//! Configuration module
//!
//! This module defines the mirror run configuration, loads optional TOML
//! configuration files, and validates the combined settings before any
//! network activity starts.
//!
//! # Example
//!
//! ```no_run
//! use snapmirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Mirroring {} at {}", config.capture.url, config.capture.snapshot);
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{
    compute_config_hash, load_config, previous_config_hash, record_config_hash,
};
pub use types::{
    CaptureConfig, Config, CrawlerConfig, FetcherKind, NetworkConfig, OutputConfig,
};
pub use validation::validate;

//! Crawl-and-download engine
//!
//! This module contains the core mirroring logic:
//! - Pluggable fetch transport with outcome classification
//! - Retry with exponential backoff and jitter
//! - HTML/CSS asset and hyperlink extraction
//! - Level-synchronized BFS frontier with shared dedup
//! - Bounded-concurrency orchestration

#[cfg(feature = "browser")]
mod browser;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod retry;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use coordinator::Coordinator;
pub use extractor::{extract_css_assets, extract_page, AssetRef, ExtractedPage, MediaType};
pub use fetcher::{FetchOutcome, Fetcher, HttpFetcher};
pub use frontier::{CrawlTask, Frontier, TaskKind, VisitedSet};
pub use retry::{fetch_with_retry, RetryPolicy};

use crate::config::Config;
use crate::output::MirrorSummary;
use crate::SnapError;

/// Runs a complete mirror operation
///
/// This is the main entry point: it binds the configured fetch transport,
/// prepares the output directory, and drives the BFS to completion.
///
/// # Arguments
///
/// * `config` - The validated run configuration
///
/// # Returns
///
/// * `Ok(MirrorSummary)` - Run finished; per-task failures are inside
/// * `Err(SnapError)` - Startup failed before any network activity
pub async fn mirror(config: Config) -> Result<MirrorSummary, SnapError> {
    let mut coordinator = Coordinator::new(config).await?;
    coordinator.run().await
}

//! Crawl coordinator - main mirror orchestration logic
//!
//! This module drives the whole run:
//! - Seeding the frontier from the capture address
//! - Level-by-level BFS with a per-level completion barrier
//! - Semaphore-bounded concurrent fetching for pages and assets
//! - Page-then-assets ordering (a page task is not drained until its own
//!   asset set is exhausted)
//! - Resume handling (materialized pages are re-parsed, never re-fetched)
//! - Run accounting and the final summary

use crate::archive::CaptureAddress;
use crate::config::{
    compute_config_hash, previous_config_hash, record_config_hash, validate, Config, FetcherKind,
};
use crate::crawler::extractor::{extract_css_assets, extract_page, AssetRef, MediaType};
use crate::crawler::fetcher::{FetchOutcome, Fetcher, HttpFetcher};
use crate::crawler::frontier::{CrawlTask, Frontier, VisitedSet};
use crate::crawler::retry::{fetch_with_retry, RetryPolicy};
use crate::output::{FailureClass, MirrorSummary, RunStats};
use crate::storage::StorageWriter;
use crate::url::same_site;
use crate::SnapError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Shared state every worker needs
struct RunContext {
    root: CaptureAddress,
    root_host: String,
    fetcher: Arc<dyn Fetcher>,
    writer: StorageWriter,
    policy: RetryPolicy,
    visited: VisitedSet,
    stats: RunStats,
    semaphore: Semaphore,
    download_assets: bool,
    sequential_assets: bool,
}

/// What a page worker hands back to the coordinator
struct PageResult {
    page_url: Url,
    links: Vec<Url>,
}

/// Main crawl coordinator
pub struct Coordinator {
    ctx: Arc<RunContext>,
    frontier: Frontier,
}

impl Coordinator {
    /// Creates a coordinator for the configured mirror run
    ///
    /// This is the startup boundary: configuration validation, capture
    /// address construction, output directory creation, and fetcher binding
    /// all happen here. Any error returned aborts the run before network
    /// activity starts.
    pub async fn new(config: Config) -> Result<Self, SnapError> {
        validate(&config).map_err(SnapError::Config)?;

        let root = CaptureAddress::with_base(
            &config.capture.url,
            &config.capture.snapshot,
            &config.network.archive_base,
        )?;
        let root_host = root.host()?;

        let output_dir = config
            .output
            .directory
            .clone()
            .unwrap_or_else(|| root_host.clone());
        let writer = StorageWriter::new(output_dir)?;

        // Detect a resume with different settings than the original run
        let hash = compute_config_hash(&config).map_err(SnapError::Config)?;
        if let Some(previous) = previous_config_hash(writer.root()) {
            if previous != hash {
                tracing::warn!(
                    "Output directory {} was created with different settings; \
                     resuming anyway",
                    writer.root().display()
                );
            }
        }
        record_config_hash(writer.root(), &hash).map_err(SnapError::Config)?;

        let fetcher = build_fetcher(&config).await?;

        let visited = VisitedSet::new();
        visited.insert(root.original_url());

        let mut frontier = Frontier::new(config.crawler.max_level);
        frontier.seed(root.original_url().clone());

        let ctx = RunContext {
            root,
            root_host,
            fetcher,
            writer,
            policy: RetryPolicy::from_config(&config.crawler),
            visited,
            stats: RunStats::new(),
            semaphore: Semaphore::new(config.crawler.max_concurrency as usize),
            download_assets: config.crawler.download_assets,
            sequential_assets: config.crawler.sequential_assets,
        };

        Ok(Self {
            ctx: Arc::new(ctx),
            frontier,
        })
    }

    /// The output directory this run mirrors into
    pub fn output_dir(&self) -> &std::path::Path {
        self.ctx.writer.root()
    }

    /// Runs the mirror to completion and returns the run summary
    ///
    /// Levels are processed strictly in order: every page task of the
    /// current level - including its asset set - reaches a terminal outcome
    /// before the next level's tasks are spawned. The per-level join below
    /// is that completion barrier.
    pub async fn run(&mut self) -> Result<MirrorSummary, SnapError> {
        let start = std::time::Instant::now();
        tracing::info!(
            "Mirroring {} at capture {} into {}",
            self.ctx.root.original_url(),
            self.ctx.root.timestamp(),
            self.ctx.writer.root().display()
        );

        loop {
            let tasks = self.frontier.take_current();
            if tasks.is_empty() {
                break;
            }

            let level = self.frontier.level();
            tracing::info!("Processing level {} ({} pages)", level, tasks.len());
            let follow_links = self.frontier.accepts_next_level();

            let mut workers = JoinSet::new();
            for task in tasks {
                let ctx = Arc::clone(&self.ctx);
                workers.spawn(process_page(ctx, task, follow_links));
            }

            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(PageResult { page_url, links }) => {
                        for link in links {
                            if !same_site(&link, &self.ctx.root_host) {
                                tracing::trace!("Off-site link dropped: {}", link);
                                continue;
                            }
                            if !self.ctx.visited.insert(&link) {
                                continue;
                            }
                            self.frontier.enqueue_next(link, &page_url);
                        }
                    }
                    Err(e) => tracing::error!("Page worker panicked: {}", e),
                }
            }

            if !self.frontier.advance_level() {
                break;
            }
        }

        let summary = self.ctx.stats.summary();
        tracing::info!(
            "Mirror finished in {:?}: {} fetched, {} skipped, {} failed",
            start.elapsed(),
            summary.total_fetched(),
            summary.pages_skipped + summary.assets_skipped,
            summary.failures.len()
        );
        Ok(summary)
    }
}

/// Binds the configured fetch transport
async fn build_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>, SnapError> {
    let timeout = Duration::from_secs(config.crawler.fetch_timeout_secs);

    match config.network.fetcher {
        FetcherKind::Http => Ok(Arc::new(HttpFetcher::new(&config.network, timeout)?)),
        FetcherKind::Browser => {
            #[cfg(feature = "browser")]
            {
                let fetcher =
                    crate::crawler::browser::BrowserFetcher::launch(&config.network, timeout)
                        .await?;
                Ok(Arc::new(fetcher))
            }
            #[cfg(not(feature = "browser"))]
            {
                Err(SnapError::BrowserUnavailable)
            }
        }
    }
}

/// Processes one page task to its terminal outcome
///
/// Fetch (or reuse the materialized copy) -> write -> extract -> drain the
/// page's own assets -> hand hyperlinks back for the next level.
async fn process_page(ctx: Arc<RunContext>, task: CrawlTask, follow_links: bool) -> PageResult {
    let page_url = task.url;
    tracing::debug!("Processing page (level {}): {}", task.level, page_url);

    let Some(bytes) = acquire_page_bytes(&ctx, &page_url).await else {
        return PageResult {
            page_url,
            links: Vec::new(),
        };
    };

    let html = String::from_utf8_lossy(&bytes);
    let extracted = extract_page(&html, &page_url);

    if ctx.download_assets && !extracted.assets.is_empty() {
        tracing::debug!(
            "Downloading {} assets referenced by {}",
            extracted.assets.len(),
            page_url
        );
        process_assets(&ctx, extracted.assets).await;
    }

    let links = if follow_links {
        extracted.links
    } else {
        Vec::new()
    };

    PageResult { page_url, links }
}

/// Produces the page body, fetching it or reading the materialized copy
///
/// Returns None when the page reached a terminal failure; the failure has
/// already been recorded.
async fn acquire_page_bytes(ctx: &RunContext, page_url: &Url) -> Option<Vec<u8>> {
    if ctx.writer.should_skip(page_url) {
        tracing::debug!("Already materialized, skipping fetch: {}", page_url);
        ctx.stats.record_page_skipped();
        // Re-parse the cached copy so the crawl still descends through it
        return ctx.writer.read_existing(page_url);
    }

    let snapshot = ctx.root.for_url(page_url.clone()).snapshot_url();
    let outcome = {
        let _permit = ctx.semaphore.acquire().await.ok()?;
        fetch_with_retry(ctx.fetcher.as_ref(), &snapshot, &ctx.policy).await
    };

    match outcome {
        FetchOutcome::Success { bytes, .. } => match ctx.writer.write(page_url, &bytes) {
            Ok(path) => {
                tracing::debug!("Wrote {}", path.display());
                ctx.stats.record_page_fetched();
                Some(bytes)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                ctx.stats.record_failure(page_url.as_str(), FailureClass::Write);
                None
            }
        },
        other => {
            if let Some(class) = FailureClass::from_outcome(&other) {
                ctx.stats.record_failure(page_url.as_str(), class);
            }
            None
        }
    }
}

/// Drains a page's asset set, then one nested pass for stylesheet imports
///
/// Stylesheets fetched in the first pass are parsed for `url()` references;
/// those join a second batch. Nesting stops there - a stylesheet referenced
/// by a stylesheet is fetched but not descended into again.
async fn process_assets(ctx: &Arc<RunContext>, assets: Vec<AssetRef>) {
    let nested = run_asset_batch(ctx, assets).await;
    if !nested.is_empty() {
        run_asset_batch(ctx, nested).await;
    }
}

/// Fetches a batch of assets, concurrently or one at a time per config
///
/// Returns the nested references extracted from any stylesheets in the
/// batch.
async fn run_asset_batch(ctx: &Arc<RunContext>, assets: Vec<AssetRef>) -> Vec<AssetRef> {
    let mut nested = Vec::new();

    if ctx.sequential_assets {
        for asset in assets {
            nested.extend(fetch_asset(Arc::clone(ctx), asset).await);
        }
    } else {
        let mut workers = JoinSet::new();
        for asset in assets {
            workers.spawn(fetch_asset(Arc::clone(ctx), asset));
        }
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(more) => nested.extend(more),
                Err(e) => tracing::error!("Asset worker panicked: {}", e),
            }
        }
    }

    nested
}

/// Fetches a single asset to its terminal outcome
///
/// The VisitedSet claim is the dedup point: whichever page (or the page
/// frontier itself) claims a URL first fetches it, everyone else drops it.
/// Stylesheets return the references found inside their bytes.
async fn fetch_asset(ctx: Arc<RunContext>, asset: AssetRef) -> Vec<AssetRef> {
    let url = asset.url;

    if !ctx.visited.insert(&url) {
        return Vec::new();
    }

    let is_stylesheet = asset.media_type == MediaType::Stylesheet;

    let bytes: Option<Vec<u8>> = if ctx.writer.should_skip(&url) {
        tracing::debug!("Already materialized, skipping asset: {}", url);
        ctx.stats.record_asset_skipped();
        if is_stylesheet {
            ctx.writer.read_existing(&url)
        } else {
            None
        }
    } else {
        let snapshot = ctx.root.for_url(url.clone()).snapshot_url();
        let outcome = {
            let _permit = match ctx.semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return Vec::new(),
            };
            fetch_with_retry(ctx.fetcher.as_ref(), &snapshot, &ctx.policy).await
        };

        match outcome {
            FetchOutcome::Success { bytes, .. } => match ctx.writer.write(&url, &bytes) {
                Ok(_) => {
                    ctx.stats.record_asset_fetched();
                    if is_stylesheet {
                        Some(bytes)
                    } else {
                        None
                    }
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    ctx.stats.record_failure(url.as_str(), FailureClass::Write);
                    None
                }
            },
            other => {
                if let Some(class) = FailureClass::from_outcome(&other) {
                    tracing::debug!("Asset referenced by {} failed: {}", asset.source, url);
                    ctx.stats.record_failure(url.as_str(), class);
                }
                None
            }
        }
    };

    match bytes {
        Some(b) if is_stylesheet => extract_css_assets(&String::from_utf8_lossy(&b), &url),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptureConfig;

    fn test_config(dir: &std::path::Path) -> Config {
        Config {
            capture: CaptureConfig {
                url: "http://example.com".to_string(),
                snapshot: "20240417160532".to_string(),
            },
            crawler: Default::default(),
            network: Default::default(),
            output: crate::config::OutputConfig {
                directory: Some(dir.join("mirror").display().to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_coordinator_creation() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = Coordinator::new(test_config(dir.path())).await.unwrap();
        assert!(coordinator.output_dir().ends_with("mirror"));
        assert!(coordinator.output_dir().exists());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.crawler.max_concurrency = 0;
        assert!(Coordinator::new(config).await.is_err());
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_browser_kind_without_feature_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.network.fetcher = FetcherKind::Browser;
        let result = Coordinator::new(config).await;
        assert!(matches!(result, Err(SnapError::BrowserUnavailable)));
    }
}

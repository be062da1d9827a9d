//! Run accounting and summary output
//!
//! This module tracks what a mirror run did - pages and assets fetched,
//! resume skips, failures by classification - and renders the end-of-run
//! summary. Per-task failures land here instead of aborting the crawl; no
//! failure silently disappears.

mod stats;

pub use stats::{print_summary, FailedUrl, FailureClass, MirrorSummary, RunStats};

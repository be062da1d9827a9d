use crate::crawler::FetchOutcome;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Classification of a failed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureClass {
    /// The archive has no such capture
    NotFound,

    /// Retries exhausted while throttled
    RateLimited,

    /// Retries exhausted on transient errors
    Transient,

    /// Unrecoverable fetch failure
    Fatal,

    /// Local storage error
    Write,
}

impl FailureClass {
    /// Derives the failure class from a terminal non-success fetch outcome
    pub fn from_outcome(outcome: &FetchOutcome) -> Option<Self> {
        match outcome {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::NotFound => Some(Self::NotFound),
            FetchOutcome::RateLimited => Some(Self::RateLimited),
            FetchOutcome::TransientError { .. } => Some(Self::Transient),
            FetchOutcome::FatalError { .. } => Some(Self::Fatal),
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::RateLimited => "rate limited",
            Self::Transient => "transient error",
            Self::Fatal => "fatal error",
            Self::Write => "write failure",
        };
        write!(f, "{}", label)
    }
}

/// A task that reached a terminal failure
#[derive(Debug, Clone)]
pub struct FailedUrl {
    pub url: String,
    pub class: FailureClass,
}

/// Shared run counters, updated concurrently by all workers
#[derive(Debug, Default)]
pub struct RunStats {
    pages_fetched: AtomicU64,
    pages_skipped: AtomicU64,
    assets_fetched: AtomicU64,
    assets_skipped: AtomicU64,
    failures: Mutex<Vec<FailedUrl>>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_page_skipped(&self) {
        self.pages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_asset_fetched(&self) {
        self.assets_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_asset_skipped(&self) {
        self.assets_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, url: &str, class: FailureClass) {
        tracing::warn!("Task failed ({}): {}", class, url);
        self.failures.lock().unwrap().push(FailedUrl {
            url: url.to_string(),
            class,
        });
    }

    /// Snapshots the counters into an immutable summary
    pub fn summary(&self) -> MirrorSummary {
        MirrorSummary {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_skipped: self.pages_skipped.load(Ordering::Relaxed),
            assets_fetched: self.assets_fetched.load(Ordering::Relaxed),
            assets_skipped: self.assets_skipped.load(Ordering::Relaxed),
            failures: self.failures.lock().unwrap().clone(),
        }
    }
}

/// Immutable end-of-run summary
#[derive(Debug, Clone)]
pub struct MirrorSummary {
    pub pages_fetched: u64,
    pub pages_skipped: u64,
    pub assets_fetched: u64,
    pub assets_skipped: u64,
    pub failures: Vec<FailedUrl>,
}

impl MirrorSummary {
    /// Failure counts grouped by classification
    pub fn failures_by_class(&self) -> BTreeMap<FailureClass, u64> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.class).or_insert(0) += 1;
        }
        counts
    }

    /// Total number of network fetches performed
    pub fn total_fetched(&self) -> u64 {
        self.pages_fetched + self.assets_fetched
    }
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &MirrorSummary) {
    println!("=== Mirror Summary ===\n");
    println!("Pages fetched:  {}", summary.pages_fetched);
    println!("Pages skipped:  {}", summary.pages_skipped);
    println!("Assets fetched: {}", summary.assets_fetched);
    println!("Assets skipped: {}", summary.assets_skipped);

    if summary.failures.is_empty() {
        println!("\nNo failures.");
        return;
    }

    println!("\nFailures by classification:");
    for (class, count) in summary.failures_by_class() {
        println!("  {}: {}", class, count);
    }

    println!("\nFailed URLs:");
    for failure in &summary.failures {
        println!("  [{}] {}", failure.class, failure.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = RunStats::new();
        stats.record_page_fetched();
        stats.record_page_fetched();
        stats.record_page_skipped();
        stats.record_asset_fetched();
        stats.record_asset_skipped();

        let summary = stats.summary();
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.pages_skipped, 1);
        assert_eq!(summary.assets_fetched, 1);
        assert_eq!(summary.assets_skipped, 1);
        assert_eq!(summary.total_fetched(), 3);
    }

    #[test]
    fn test_failures_grouped() {
        let stats = RunStats::new();
        stats.record_failure("http://example.com/a", FailureClass::NotFound);
        stats.record_failure("http://example.com/b", FailureClass::NotFound);
        stats.record_failure("http://example.com/c", FailureClass::Transient);

        let summary = stats.summary();
        let grouped = summary.failures_by_class();
        assert_eq!(grouped[&FailureClass::NotFound], 2);
        assert_eq!(grouped[&FailureClass::Transient], 1);
        assert_eq!(summary.failures.len(), 3);
    }

    #[test]
    fn test_class_from_outcome() {
        assert_eq!(
            FailureClass::from_outcome(&FetchOutcome::NotFound),
            Some(FailureClass::NotFound)
        );
        assert_eq!(
            FailureClass::from_outcome(&FetchOutcome::Success {
                bytes: vec![],
                content_type: String::new(),
                final_url: String::new()
            }),
            None
        );
    }
}

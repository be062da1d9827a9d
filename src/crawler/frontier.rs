//! BFS frontier and visited-set
//!
//! The frontier owns the level-bucketed queue of page tasks and the level
//! counter. The `VisitedSet` is shared with the asset pipeline: every URL
//! the run schedules, page or asset, passes through its single atomic
//! check-and-insert, which is what prevents duplicate scheduling across
//! concurrent producers.

use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

/// What a crawl task fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Page,
    Asset,
}

/// Unit of work in the crawl pipeline
///
/// Created by BFS expansion or asset extraction, consumed exactly once,
/// never mutated after creation.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// Normalized original URL of the resource
    pub url: Url,

    /// BFS level this task belongs to (the root is level 1)
    pub level: u32,

    pub kind: TaskKind,

    /// URL of the page that discovered this one
    pub referrer: Option<String>,
}

/// Set of URLs already scheduled or completed in this run
///
/// Membership check and insertion are a single operation behind one mutex;
/// a URL can enter the set at most once no matter how many workers race on
/// it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims a URL; returns true if this caller claimed it first
    pub fn insert(&self, url: &Url) -> bool {
        self.inner.lock().unwrap().insert(url.as_str().to_string())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.inner.lock().unwrap().contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Level-synchronized BFS queue over discovered pages
///
/// Tasks within a level have no defined order; the guarantee is across
/// levels: level L+1 tasks are invisible until level L fully drains. The
/// coordinator enforces the drain (its per-level join is the completion
/// barrier); the frontier enforces the bookkeeping.
pub struct Frontier {
    current: Vec<CrawlTask>,
    next: Vec<CrawlTask>,
    level: u32,
    max_level: u32,
}

impl Frontier {
    pub fn new(max_level: u32) -> Self {
        Self {
            current: Vec::new(),
            next: Vec::new(),
            level: 1,
            max_level: max_level.max(1),
        }
    }

    /// Seeds the frontier with the crawl root at level 1
    ///
    /// The root must already be claimed in the VisitedSet by the caller.
    pub fn seed(&mut self, url: Url) {
        self.current.push(CrawlTask {
            url,
            level: 1,
            kind: TaskKind::Page,
            referrer: None,
        });
    }

    /// Current BFS level (1-based)
    pub fn level(&self) -> u32 {
        self.level
    }

    /// True when link discovery at the current level may still enqueue work
    pub fn accepts_next_level(&self) -> bool {
        self.level < self.max_level
    }

    /// Queues a discovered page for the next level
    ///
    /// The caller is expected to have domain-filtered the URL and claimed it
    /// in the VisitedSet; enqueueing is rejected once the depth bound is
    /// reached.
    pub fn enqueue_next(&mut self, url: Url, referrer: &Url) -> bool {
        if !self.accepts_next_level() {
            return false;
        }
        self.next.push(CrawlTask {
            url,
            level: self.level + 1,
            kind: TaskKind::Page,
            referrer: Some(referrer.as_str().to_string()),
        });
        true
    }

    /// Hands the coordinator every outstanding task of the current level
    pub fn take_current(&mut self) -> Vec<CrawlTask> {
        std::mem::take(&mut self.current)
    }

    /// Advances to the next level once the current one has drained
    ///
    /// Returns false when the run is terminal: either the depth bound is
    /// reached or no tasks were discovered for the next level.
    pub fn advance_level(&mut self) -> bool {
        if self.level >= self.max_level || self.next.is_empty() {
            return false;
        }
        self.level += 1;
        self.current = std::mem::take(&mut self.next);
        true
    }
}

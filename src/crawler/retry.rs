//! Retry policy with exponential backoff and jitter
//!
//! The upstream is a shared, rate-limited service: immediate re-fetching of
//! a throttled URL makes the throttling worse, and synchronized retries
//! across concurrent workers re-create the burst that got throttled in the
//! first place. Delays therefore grow exponentially and carry a random
//! jitter component.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use rand::Rng;
use std::time::Duration;

/// Upper bound on any single backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Bounded exponential-backoff retry schedule
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total fetch attempts per URL (includes the first try)
    pub max_attempts: u32,

    /// Base delay; attempt n waits base * 2^(n-1) plus jitter in [0, base)
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }

    /// Delay before the next attempt, given how many attempts already ran
    fn delay_after(&self, attempts_made: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exp_ms = base_ms.saturating_mul(2u64.saturating_pow(attempts_made.saturating_sub(1)));
        let capped_ms = exp_ms.min(MAX_BACKOFF.as_millis() as u64);

        let jitter_ms = if base_ms > 0 {
            rand::thread_rng().gen_range(0..base_ms)
        } else {
            0
        };

        Duration::from_millis(capped_ms + jitter_ms)
    }
}

/// Wraps a fetch call with the retry schedule
///
/// `RateLimited` and `TransientError` outcomes are re-attempted up to
/// `max_attempts` total tries; `NotFound` and `FatalError` propagate
/// immediately. When attempts are exhausted the last retryable outcome is
/// returned as-is - the caller records it as a per-task failure and the
/// crawl continues.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
) -> FetchOutcome {
    let mut outcome = fetcher.fetch(url).await;
    let mut attempts = 1;

    while outcome.is_retryable() && attempts < policy.max_attempts {
        let delay = policy.delay_after(attempts);
        tracing::warn!(
            "Attempt {}/{} failed for {}, retrying in {:?}",
            attempts,
            policy.max_attempts,
            url,
            delay
        );
        tokio::time::sleep(delay).await;

        outcome = fetcher.fetch(url).await;
        attempts += 1;
    }

    outcome
}

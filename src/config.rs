//! Crawl limits, tunable through the environment.
//!
//! Serverless hosts set small caps (`BRANDPROBE_MAX_PAGES=3`,
//! `BRANDPROBE_JOB_BUDGET_MS=25000`); long-running hosts can raise them.

use std::time::Duration;

/// Default user agent sent with navigation and robots.txt requests.
pub const DEFAULT_USER_AGENT: &str = concat!("brandprobe/", env!("CARGO_PKG_VERSION"));

/// Limits for a single crawl job.
#[derive(Debug, Clone)]
pub struct CrawlLimits {
    /// Maximum number of pages to extract.
    pub max_pages: usize,
    /// Maximum link depth from the seed (seed is depth 0).
    pub max_depth: u32,
    /// Per-page navigation timeout.
    pub page_timeout: Duration,
    /// Extra settle delay after navigation, for lazy-loaded assets.
    pub settle_delay: Duration,
    /// Politeness delay between consecutive page fetches.
    pub request_delay: Duration,
    /// Maximum navigation attempts per page.
    pub max_retries: u32,
    /// Base delay for exponential retry backoff.
    pub retry_base_delay: Duration,
    /// User agent string for navigation and robots.txt.
    pub user_agent: String,
    /// Optional wall-clock budget for the whole job. `None` means unbounded.
    pub job_budget: Option<Duration>,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_pages: 5,
            max_depth: 1,
            page_timeout: Duration::from_millis(20_000),
            settle_delay: Duration::from_millis(1_200),
            request_delay: Duration::from_millis(500),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(750),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            job_budget: None,
        }
    }
}

impl CrawlLimits {
    /// Build limits from `BRANDPROBE_*` environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut limits = Self::default();
        if let Some(v) = env_usize("BRANDPROBE_MAX_PAGES") {
            limits.max_pages = v;
        }
        if let Some(v) = env_u64("BRANDPROBE_MAX_DEPTH") {
            limits.max_depth = v as u32;
        }
        if let Some(v) = env_u64("BRANDPROBE_PAGE_TIMEOUT_MS") {
            limits.page_timeout = Duration::from_millis(v);
        }
        if let Some(v) = env_u64("BRANDPROBE_SETTLE_DELAY_MS") {
            limits.settle_delay = Duration::from_millis(v);
        }
        if let Some(v) = env_u64("BRANDPROBE_REQUEST_DELAY_MS") {
            limits.request_delay = Duration::from_millis(v);
        }
        if let Some(v) = env_u64("BRANDPROBE_MAX_RETRIES") {
            limits.max_retries = v as u32;
        }
        if let Some(v) = env_u64("BRANDPROBE_RETRY_BASE_DELAY_MS") {
            limits.retry_base_delay = Duration::from_millis(v);
        }
        if let Ok(v) = std::env::var("BRANDPROBE_USER_AGENT") {
            if !v.is_empty() {
                limits.user_agent = v;
            }
        }
        if let Some(v) = env_u64("BRANDPROBE_JOB_BUDGET_MS") {
            limits.job_budget = Some(Duration::from_millis(v));
        }
        limits
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.parse().ok()
}

//! Shared configuration constants for release_harvester
//!
//! Default values used by the config builder and the serde defaults so a
//! JSON config file and a programmatic build agree.

/// Press-release listing the crawler paginates by default
pub const DEFAULT_BASE_URL: &str = "https://www.prnewswire.com/news-releases/news-releases-list/";

/// Listing rows requested per index page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Concurrent article workers per index page
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Progress and cursor are flushed every this many completed pages
pub const DEFAULT_FLUSH_EVERY_PAGES: u32 = 10;

/// Consecutive index-page fetch failures tolerated before the crawl stops
pub const DEFAULT_MAX_CONSECUTIVE_PAGE_FAILURES: u32 = 3;

/// Replay attempts after which a retry entry is left for manual pruning
pub const DEFAULT_MAX_REPLAY_ATTEMPTS: u32 = 5;

/// Keyword hits an article needs before it is saved
pub const DEFAULT_MIN_KEYWORD_HITS: usize = 2;

/// Case-insensitive keyword set used by the article filter
pub const DEFAULT_KEYWORDS: &[&str] = &["venture", "VC", "series", "round", "valuation", "unicorn"];

/// Readiness wait for an index page listing (seconds)
pub const DEFAULT_INDEX_READY_TIMEOUT_SECS: u64 = 50;

/// Readiness wait for an article page wrapper (seconds)
pub const DEFAULT_ARTICLE_READY_TIMEOUT_SECS: u64 = 20;

/// Timeout for `page.goto()` navigation (seconds)
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;

/// Offset applied to the latest listing timestamp when a bootstrap epoch starts
pub const BOOTSTRAP_OFFSET_HOURS: i64 = 1;

/// Longest slug prefix taken from an article's last path segment
pub const MAX_SLUG_SEGMENT_CHARS: usize = 120;

/// Chrome user agent string presented by the rendering browser
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

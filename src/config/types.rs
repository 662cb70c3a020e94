//! Core configuration types for the press-release crawl
//!
//! `CrawlConfig` carries every tunable of a run. It deserializes from JSON with
//! defaults for every absent field, so a config file only needs the values it
//! changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crawl_engine::DateFilter;
use crate::page_extractor::{ExtractionTemplate, IndexSelectors, default_templates};
use crate::utils::{
    DEFAULT_ARTICLE_READY_TIMEOUT_SECS, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY,
    DEFAULT_FLUSH_EVERY_PAGES, DEFAULT_INDEX_READY_TIMEOUT_SECS, DEFAULT_KEYWORDS,
    DEFAULT_MAX_CONSECUTIVE_PAGE_FAILURES, DEFAULT_MAX_REPLAY_ATTEMPTS, DEFAULT_MIN_KEYWORD_HITS,
    DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_PAGE_SIZE,
};

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("invalid CSS selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("invalid keyword list: {0}")]
    InvalidKeywords(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Main configuration struct for a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Directory receiving one `.txt` file per accepted article
    pub(crate) storage_dir: PathBuf,
    /// Cursor, progress, epoch, failure log and retry queue.
    /// Defaults to `<storage_dir>/.state`
    pub(crate) state_dir: Option<PathBuf>,

    /// Listing endpoint; paging and date parameters are appended
    pub(crate) base_url: String,
    pub(crate) page_size: u32,
    /// Filter for the first epoch; later epochs come from bootstrapping
    pub(crate) date_filter: DateFilter,

    /// Cursor value at which a new epoch is derived from the page's newest
    /// timestamp. `None` disables bootstrapping
    pub(crate) bootstrap_page: Option<u32>,

    /// Articles rendered at once
    pub(crate) concurrency: usize,
    pub(crate) flush_every_pages: u32,
    pub(crate) max_pages: Option<u32>,
    pub(crate) max_epochs: Option<u32>,
    pub(crate) max_consecutive_page_failures: u32,
    pub(crate) max_replay_attempts: u32,

    pub(crate) keywords: Vec<String>,
    pub(crate) min_keyword_hits: usize,
    /// Tried in order; the first one matching locates the article body
    pub(crate) templates: Vec<ExtractionTemplate>,
    pub(crate) index_selectors: IndexSelectors,
    /// chrono format of listing timestamps, zone suffix excluded
    pub(crate) timestamp_format: String,

    /// Selector signalling a rendered listing page
    pub(crate) index_ready_selector: String,
    /// Selector signalling a rendered article page
    pub(crate) article_ready_selector: String,
    pub(crate) index_ready_timeout_secs: u64,
    pub(crate) article_ready_timeout_secs: u64,
    /// Bound on `page.goto()`
    pub(crate) page_load_timeout_secs: u64,

    pub(crate) headless: bool,
    /// Browser profile directory; a temporary one is created when unset
    pub(crate) chrome_data_dir: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./articles"),
            state_dir: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            date_filter: DateFilter::default(),
            bootstrap_page: None,
            concurrency: DEFAULT_CONCURRENCY,
            flush_every_pages: DEFAULT_FLUSH_EVERY_PAGES,
            max_pages: None,
            max_epochs: None,
            max_consecutive_page_failures: DEFAULT_MAX_CONSECUTIVE_PAGE_FAILURES,
            max_replay_attempts: DEFAULT_MAX_REPLAY_ATTEMPTS,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
            min_keyword_hits: DEFAULT_MIN_KEYWORD_HITS,
            templates: default_templates(),
            index_selectors: IndexSelectors::default(),
            timestamp_format: "%b %d, %Y, %H:%M".to_string(),
            index_ready_selector: ".prncom.prncom_news-releases.prncom_news-releases_headline-listing"
                .to_string(),
            article_ready_selector: "#mm-0".to_string(),
            index_ready_timeout_secs: DEFAULT_INDEX_READY_TIMEOUT_SECS,
            article_ready_timeout_secs: DEFAULT_ARTICLE_READY_TIMEOUT_SECS,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            headless: true,
            chrome_data_dir: None,
        }
    }
}

impl CrawlConfig {
    /// Read a JSON config file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the crawl relies on.
    ///
    /// Selectors, templates and keywords are compiled here once so a bad
    /// value fails at startup instead of on the first page.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                message: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.flush_every_pages == 0 {
            return Err(ConfigError::Invalid("flush_every_pages must be at least 1".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if self.max_consecutive_page_failures == 0 {
            return Err(ConfigError::Invalid(
                "max_consecutive_page_failures must be at least 1".into(),
            ));
        }
        if self.bootstrap_page == Some(0) {
            return Err(ConfigError::Invalid("bootstrap_page must be at least 1".into()));
        }
        self.date_filter.validate()?;

        crate::page_extractor::ArticleFilter::from_config(self)?;
        crate::page_extractor::LinkExtractor::from_config(self)?;
        for selector in [&self.index_ready_selector, &self.article_ready_selector] {
            crate::page_extractor::compile_selector(selector)?;
        }
        Ok(())
    }
}

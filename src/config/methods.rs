//! Builder methods available for all states

use std::path::PathBuf;

use super::builder::CrawlConfigBuilder;
use crate::crawl_engine::DateFilter;
use crate::page_extractor::{ExtractionTemplate, IndexSelectors};

impl<State> CrawlConfigBuilder<State> {
    /// Directory for cursor, progress and failure files
    #[must_use]
    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.state_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.config.page_size = size;
        self
    }

    /// Date filter of the first epoch
    #[must_use]
    pub fn date_filter(mut self, filter: DateFilter) -> Self {
        self.config.date_filter = filter;
        self
    }

    /// Cursor value that triggers a new epoch.
    ///
    /// When the crawl finishes that page, the newest listed timestamp plus one
    /// hour becomes the next date filter and paging restarts at 1.
    #[must_use]
    pub fn bootstrap_page(mut self, page: Option<u32>) -> Self {
        self.config.bootstrap_page = page;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.config.concurrency = workers;
        self
    }

    #[must_use]
    pub fn flush_every_pages(mut self, pages: u32) -> Self {
        self.config.flush_every_pages = pages;
        self
    }

    #[must_use]
    pub fn max_pages(mut self, pages: Option<u32>) -> Self {
        self.config.max_pages = pages;
        self
    }

    #[must_use]
    pub fn max_epochs(mut self, epochs: Option<u32>) -> Self {
        self.config.max_epochs = epochs;
        self
    }

    #[must_use]
    pub fn max_consecutive_page_failures(mut self, failures: u32) -> Self {
        self.config.max_consecutive_page_failures = failures;
        self
    }

    #[must_use]
    pub fn max_replay_attempts(mut self, attempts: u32) -> Self {
        self.config.max_replay_attempts = attempts;
        self
    }

    #[must_use]
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn min_keyword_hits(mut self, hits: usize) -> Self {
        self.config.min_keyword_hits = hits;
        self
    }

    #[must_use]
    pub fn templates(mut self, templates: Vec<ExtractionTemplate>) -> Self {
        self.config.templates = templates;
        self
    }

    #[must_use]
    pub fn index_selectors(mut self, selectors: IndexSelectors) -> Self {
        self.config.index_selectors = selectors;
        self
    }

    #[must_use]
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.config.timestamp_format = format.into();
        self
    }

    #[must_use]
    pub fn index_ready_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.index_ready_selector = selector.into();
        self
    }

    #[must_use]
    pub fn article_ready_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.article_ready_selector = selector.into();
        self
    }

    #[must_use]
    pub fn index_ready_timeout_secs(mut self, secs: u64) -> Self {
        self.config.index_ready_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn article_ready_timeout_secs(mut self, secs: u64) -> Self {
        self.config.article_ready_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.page_load_timeout_secs = secs;
        self
    }

    /// Set browser headless mode.
    ///
    /// Headed mode is only honored in debug builds; release builds force
    /// headless with a warning.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Use a fixed browser profile directory instead of a temporary one
    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.chrome_data_dir = Some(dir.into());
        self
    }
}

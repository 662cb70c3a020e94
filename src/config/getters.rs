//! Getter methods for `CrawlConfig`

use std::path::PathBuf;
use std::time::Duration;

use super::types::CrawlConfig;
use crate::crawl_engine::DateFilter;
use crate::fetch::Readiness;
use crate::page_extractor::{ExtractionTemplate, IndexSelectors};

impl CrawlConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    /// State directory, `<storage_dir>/.state` unless configured
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| self.storage_dir.join(".state"))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn date_filter(&self) -> DateFilter {
        self.date_filter
    }

    #[must_use]
    pub fn bootstrap_page(&self) -> Option<u32> {
        self.bootstrap_page
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn flush_every_pages(&self) -> u32 {
        self.flush_every_pages
    }

    #[must_use]
    pub fn max_pages(&self) -> Option<u32> {
        self.max_pages
    }

    #[must_use]
    pub fn max_epochs(&self) -> Option<u32> {
        self.max_epochs
    }

    #[must_use]
    pub fn max_consecutive_page_failures(&self) -> u32 {
        self.max_consecutive_page_failures
    }

    #[must_use]
    pub fn max_replay_attempts(&self) -> u32 {
        self.max_replay_attempts
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn min_keyword_hits(&self) -> usize {
        self.min_keyword_hits
    }

    #[must_use]
    pub fn templates(&self) -> &[ExtractionTemplate] {
        &self.templates
    }

    #[must_use]
    pub fn index_selectors(&self) -> &IndexSelectors {
        &self.index_selectors
    }

    #[must_use]
    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    /// What a rendered listing page should contain, and how long to wait for it.
    ///
    /// Best effort: a page past the end of the listing has no container,
    /// and the empty card set is what ends the crawl.
    #[must_use]
    pub fn index_readiness(&self) -> Readiness {
        Readiness::best_effort(
            self.index_ready_selector.as_str(),
            Duration::from_secs(self.index_ready_timeout_secs),
        )
    }

    #[must_use]
    pub fn article_readiness(&self) -> Readiness {
        Readiness::new(
            self.article_ready_selector.as_str(),
            Duration::from_secs(self.article_ready_timeout_secs),
        )
    }

    /// Bound on a single navigation
    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dir_defaults_under_storage() {
        let config = CrawlConfig::builder()
            .storage_dir("/data/pr")
            .build()
            .unwrap();
        assert_eq!(config.state_dir(), PathBuf::from("/data/pr/.state"));

        let config = CrawlConfig::builder()
            .storage_dir("/data/pr")
            .state_dir("/var/lib/pr")
            .build()
            .unwrap();
        assert_eq!(config.state_dir(), PathBuf::from("/var/lib/pr"));
    }

    #[test]
    fn readiness_uses_configured_timeouts() {
        let config = CrawlConfig::builder()
            .storage_dir("/data/pr")
            .article_ready_timeout_secs(7)
            .build()
            .unwrap();
        let readiness = config.article_readiness();
        assert_eq!(readiness.selector, "#mm-0");
        assert_eq!(readiness.timeout, Duration::from_secs(7));
        assert!(readiness.required);
        assert_eq!(config.index_readiness().timeout, Duration::from_secs(50));
        assert!(!config.index_readiness().required);
    }
}

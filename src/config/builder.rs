//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! `build()` only exists once a storage directory has been chosen; every
//! other field starts from its default.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{ConfigError, CrawlConfig};

// Type states for the builder
pub struct WithStorageDir;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) config: CrawlConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            config: CrawlConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }

    /// Continue building from this config (e.g. one loaded from a file)
    #[must_use]
    pub fn into_builder(self) -> CrawlConfigBuilder<WithStorageDir> {
        CrawlConfigBuilder {
            config: self,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<()> {
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithStorageDir> {
        let mut config = self.config;
        config.storage_dir = dir.into();
        CrawlConfigBuilder {
            config,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when the storage directory is set
impl CrawlConfigBuilder<WithStorageDir> {
    /// Replace the storage directory chosen earlier
    #[must_use]
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.storage_dir = dir.into();
        self
    }

    pub fn build(self) -> Result<CrawlConfig, ConfigError> {
        let mut config = self.config;

        // Enforce headless mode in release builds
        #[cfg(not(debug_assertions))]
        if !config.headless {
            tracing::warn!(
                "Forcing headless mode in release build. \
                Headed mode is only available in debug builds for development."
            );
            config.headless = true;
        }

        config.keywords.retain(|k| !k.trim().is_empty());
        config.validate()?;
        Ok(config)
    }
}

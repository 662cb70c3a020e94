//! Incremental, resumable press-release crawler.
//!
//! Paginates a listing, renders each new article in headless Chromium, keeps
//! the ones dense enough in funding keywords, and records progress so a
//! restart picks up where the last run stopped.

pub mod browser_setup;
pub mod config;
pub mod content_saver;
pub mod crawl_engine;
pub mod fetch;
pub mod page_extractor;
pub mod progress_store;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;

pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{ConfigError, CrawlConfig};
pub use content_saver::{ContentSaver, SaveError, SavedArticle};
pub use crawl_engine::{
    ArticleOutcome, CrawlEngine, CrawlError, CrawlResult, CrawlStatus, CrawlSummary, DateFilter,
    Interrupt, NoOpProgress, ProgressReporter, ReplaySummary, StopHandle, TerminationReason,
};
pub use fetch::{ChromiumRenderer, FetchError, PageRenderer, Readiness, RenderedDocument};
pub use page_extractor::{ArticleFilter, ArticleVerdict, LinkExtractor, StructureError};
pub use progress_store::{FailureKind, ProgressStore, RetryEntry, RetryQueue, StoreError};

/// Open a crawl engine backed by a freshly launched Chromium
pub async fn open_chromium_engine<P: ProgressReporter>(
    config: CrawlConfig,
    progress: P,
) -> anyhow::Result<CrawlEngine<ChromiumRenderer, P>> {
    let renderer = ChromiumRenderer::launch(&config)
        .await
        .context("Failed to launch browser")?;
    let engine = CrawlEngine::open(config, Arc::new(renderer), progress).await?;
    Ok(engine)
}

/// Crawl with Chromium until the listing is exhausted or a bound is hit
pub async fn crawl(config: CrawlConfig) -> anyhow::Result<CrawlSummary> {
    let engine = open_chromium_engine(config, NoOpProgress).await?;
    Ok(engine.run().await?)
}

/// Replay queued failures with Chromium
pub async fn replay(config: CrawlConfig) -> anyhow::Result<ReplaySummary> {
    let engine = open_chromium_engine(config, NoOpProgress).await?;
    Ok(engine.replay().await?)
}

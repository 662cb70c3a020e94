//! Core types of the crawl engine: fatal errors, per-article outcomes and
//! run summaries.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::content_saver::SavedArticle;
use crate::progress_store::{FailureKind, StoreError};

/// Error that stops a crawl.
///
/// Per-article and per-page problems never surface here; they are logged and
/// recorded in the failure log instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("crawl state could not be persisted: {0}")]
    Store(#[from] StoreError),

    #[error("worker pool closed unexpectedly")]
    WorkerPoolClosed,
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// What happened to one article link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    /// Accepted by the filter and written to disk
    Saved(SavedArticle),
    /// Content found but too few keyword hits
    Rejected { hits: usize },
    /// Fetch, structure or save failure; the link stays unprocessed
    Failed { kind: FailureKind, error: String },
}

impl ArticleOutcome {
    /// Saved and rejected links are done; failed ones may be replayed
    #[must_use]
    pub fn is_processed(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// A link together with its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleResult {
    pub link: String,
    pub outcome: ArticleOutcome,
}

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// An index page listed no cards
    Exhausted,
    /// Too many index pages in a row failed to render
    TooManyPageFailures,
    /// `max_pages` index pages were visited
    PageLimit,
    /// `max_epochs` new epochs were started
    EpochLimit,
    /// Stop requested (Ctrl-C)
    Interrupted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exhausted => "index exhausted",
            Self::TooManyPageFailures => "too many consecutive index page failures",
            Self::PageLimit => "page limit reached",
            Self::EpochLimit => "epoch limit reached",
            Self::Interrupted => "interrupted",
        })
    }
}

/// Saved / rejected / failed counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleTally {
    pub saved: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl ArticleTally {
    pub fn record(&mut self, outcome: &ArticleOutcome) {
        match outcome {
            ArticleOutcome::Saved(_) => self.saved += 1,
            ArticleOutcome::Rejected { .. } => self.rejected += 1,
            ArticleOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Result of [`CrawlEngine::run`](super::CrawlEngine::run)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub reason: TerminationReason,
    /// Index pages whose articles were all dispatched and drained
    pub pages_completed: u32,
    /// Index pages skipped after a render failure
    pub pages_failed: u32,
    /// New epochs derived during this run
    pub epochs_started: u32,
    /// Listed links dropped because they were already processed
    pub links_skipped: usize,
    pub articles: ArticleTally,
    /// Cursor at termination
    pub final_cursor: u32,
}

/// Result of [`CrawlEngine::replay`](super::CrawlEngine::replay)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Entries run through the pipeline
    pub attempted: usize,
    /// Entries dropped because the link was processed meanwhile
    pub already_processed: usize,
    /// Entries left alone because they hit `max_replay_attempts`
    pub exhausted: usize,
    pub articles: ArticleTally,
    /// Entries still queued afterwards
    pub remaining: usize,
}

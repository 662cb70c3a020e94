//! Crawl Engine Module
//!
//! The coordinator state machine, the per-article worker pipeline, listing
//! URLs and the types a run reports back.

pub mod crawl_types;
pub mod engine;
pub mod index_query;
pub mod progress;
pub mod status;
pub mod worker;

pub use crawl_types::{
    ArticleOutcome, ArticleResult, ArticleTally, CrawlError, CrawlResult, CrawlSummary,
    ReplaySummary, TerminationReason,
};
pub use engine::{CrawlEngine, Interrupt, StopHandle};
pub use index_query::{DateFilter, IndexQuery};
pub use progress::{NoOpProgress, ProgressReporter};
pub use status::CrawlStatus;
pub use worker::process_article;

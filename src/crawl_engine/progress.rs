//! Progress reporting abstraction for crawl runs
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting
//! and provides a no-op implementation for simple use cases.

use super::crawl_types::{ArticleResult, TerminationReason};
use super::index_query::DateFilter;

/// Trait for reporting crawl progress at key lifecycle events
///
/// Called only from the coordinating task, in crawl order.
pub trait ProgressReporter: Send + Sync {
    /// An index page is about to be rendered
    fn report_page_started(&self, cursor: u32, url: &str);

    /// Links found on an index page, before and after dropping known ones
    fn report_page_links(&self, cursor: u32, listed: usize, dispatched: usize);

    /// An index page could not be rendered and was skipped
    fn report_page_failed(&self, cursor: u32, error: &str);

    /// One article finished
    fn report_article(&self, result: &ArticleResult);

    /// A new epoch was derived
    fn report_epoch_started(&self, epoch: u32, filter: &DateFilter);

    /// State was persisted after index page `cursor` drained
    fn report_flushed(&self, cursor: u32);

    /// The crawl stopped
    fn report_terminated(&self, reason: TerminationReason);
}

/// Progress reporter that does nothing
///
/// All methods are no-ops and will be inlined away by the compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_page_started(&self, _cursor: u32, _url: &str) {}

    #[inline(always)]
    fn report_page_links(&self, _cursor: u32, _listed: usize, _dispatched: usize) {}

    #[inline(always)]
    fn report_page_failed(&self, _cursor: u32, _error: &str) {}

    #[inline(always)]
    fn report_article(&self, _result: &ArticleResult) {}

    #[inline(always)]
    fn report_epoch_started(&self, _epoch: u32, _filter: &DateFilter) {}

    #[inline(always)]
    fn report_flushed(&self, _cursor: u32) {}

    #[inline(always)]
    fn report_terminated(&self, _reason: TerminationReason) {}
}

//! Crawl coordinator
//!
//! Walks the listing page by page, fans the new article links of each page
//! out to a bounded set of worker tasks, and merges their outcomes into the
//! progress store. Only this task mutates crawl state.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info, warn};
use tokio::sync::Semaphore;

use super::crawl_types::{
    ArticleOutcome, ArticleResult, ArticleTally, CrawlError, CrawlResult, CrawlSummary,
    ReplaySummary, TerminationReason,
};
use super::index_query::{DateFilter, IndexQuery};
use super::progress::{NoOpProgress, ProgressReporter};
use super::worker::process_article;
use crate::config::CrawlConfig;
use crate::content_saver::ContentSaver;
use crate::fetch::{PageRenderer, Readiness};
use crate::page_extractor::{ArticleFilter, LinkExtractor, StructureError};
use crate::progress_store::{FailureKind, FailureLog, ProgressStore, RetryQueue, StoreError};

/// Asks a running crawl to stop once the current page has drained
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Register a user interrupt.
    ///
    /// The first one asks the crawl to drain and stop; any later one means
    /// the user is done waiting.
    pub fn interrupt(&self) -> Interrupt {
        if self.0.swap(true, Ordering::SeqCst) {
            Interrupt::ForceQuit
        } else {
            Interrupt::Drain
        }
    }
}

/// What to do about a user interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Finish the current page, flush, then stop
    Drain,
    /// A stop was already pending; exit now
    ForceQuit,
}

/// Newest listing timestamp, read only on the bootstrap page
type BootstrapProbe = Option<Result<NaiveDateTime, StructureError>>;

enum CrawlState {
    FetchingPage {
        cursor: u32,
    },
    DispatchingArticles {
        cursor: u32,
        links: Vec<String>,
        bootstrap: BootstrapProbe,
    },
    Draining {
        cursor: u32,
        results: Vec<ArticleResult>,
        bootstrap: BootstrapProbe,
    },
    Terminated(TerminationReason),
}

#[derive(Debug, Default)]
struct RunCounters {
    pages_completed: u32,
    pages_failed: u32,
    consecutive_page_failures: u32,
    epochs_started: u32,
    links_skipped: usize,
    articles: ArticleTally,
}

impl RunCounters {
    fn pages_visited(&self) -> u32 {
        self.pages_completed + self.pages_failed
    }
}

/// Incremental crawl over a paginated press-release listing
pub struct CrawlEngine<R: PageRenderer, P: ProgressReporter = NoOpProgress> {
    config: CrawlConfig,
    renderer: Arc<R>,
    progress: P,
    links: LinkExtractor,
    filter: Arc<ArticleFilter>,
    saver: Arc<ContentSaver>,
    index_readiness: Readiness,
    article_readiness: Arc<Readiness>,
    query: IndexQuery,
    store: ProgressStore,
    retry: RetryQueue,
    failures: FailureLog,
    stop: StopHandle,
}

impl<R: PageRenderer, P: ProgressReporter> CrawlEngine<R, P> {
    /// Compile the extractors and load persisted state.
    ///
    /// The renderer is released if anything here fails.
    pub async fn open(config: CrawlConfig, renderer: Arc<R>, progress: P) -> CrawlResult<Self> {
        match Self::assemble(config, Arc::clone(&renderer), progress).await {
            Ok(engine) => Ok(engine),
            Err(e) => {
                renderer.release().await;
                Err(e)
            }
        }
    }

    async fn assemble(config: CrawlConfig, renderer: Arc<R>, progress: P) -> CrawlResult<Self> {
        config.validate()?;
        let links = LinkExtractor::from_config(&config)?;
        let filter = Arc::new(ArticleFilter::from_config(&config)?);
        let query = IndexQuery::new(config.base_url(), config.page_size())?;

        let state_dir = config.state_dir();
        let store = ProgressStore::open(state_dir.clone(), config.date_filter()).await?;
        let retry = RetryQueue::load(&state_dir).await?;
        let failures = FailureLog::new(&state_dir);

        Ok(Self {
            saver: Arc::new(ContentSaver::new(config.storage_dir().clone())),
            index_readiness: config.index_readiness(),
            article_readiness: Arc::new(config.article_readiness()),
            config,
            renderer,
            progress,
            links,
            filter,
            query,
            store,
            retry,
            failures,
            stop: StopHandle::default(),
        })
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    #[must_use]
    pub fn retry_queue(&self) -> &RetryQueue {
        &self.retry
    }

    /// Crawl until the listing is exhausted or a bound is hit.
    ///
    /// State is flushed and the renderer released on every exit path,
    /// including a fatal error.
    pub async fn run(mut self) -> CrawlResult<CrawlSummary> {
        let outcome = self.page_loop().await;
        let summary = self.finish(outcome).await?;
        info!(
            "Crawl finished ({}): {} pages, {} saved, {} rejected, {} failed, next page {}",
            summary.reason,
            summary.pages_completed,
            summary.articles.saved,
            summary.articles.rejected,
            summary.articles.failed,
            summary.final_cursor
        );
        Ok(summary)
    }

    /// Re-run queued failures that still have attempts left.
    ///
    /// No index pages are fetched.
    pub async fn replay(mut self) -> CrawlResult<ReplaySummary> {
        let outcome = self.replay_queue().await;
        let summary = self.finish(outcome).await?;
        info!(
            "Replay finished: {} attempted, {} saved, {} rejected, {} failed, {} still queued",
            summary.attempted,
            summary.articles.saved,
            summary.articles.rejected,
            summary.articles.failed,
            summary.remaining
        );
        Ok(summary)
    }

    /// Final flush and renderer release, whatever `outcome` is
    async fn finish<T>(&mut self, outcome: CrawlResult<T>) -> CrawlResult<T> {
        let flushed = self.flush_state().await;
        self.renderer.release().await;

        match (outcome, flushed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), flushed) => {
                if let Err(flush_err) = flushed {
                    error!("Best-effort flush after fatal error failed: {flush_err}");
                }
                Err(e)
            }
        }
    }

    async fn page_loop(&mut self) -> CrawlResult<CrawlSummary> {
        let mut counters = RunCounters::default();
        let mut state = CrawlState::FetchingPage {
            cursor: self.store.cursor(),
        };

        loop {
            state = match state {
                CrawlState::FetchingPage { cursor } => self.fetch_page(cursor, &mut counters).await,
                CrawlState::DispatchingArticles {
                    cursor,
                    links,
                    bootstrap,
                } => CrawlState::Draining {
                    cursor,
                    results: self.dispatch(links).await?,
                    bootstrap,
                },
                CrawlState::Draining {
                    cursor,
                    results,
                    bootstrap,
                } => {
                    self.drain(cursor, results, bootstrap, &mut counters)
                        .await?
                }
                CrawlState::Terminated(reason) => {
                    self.progress.report_terminated(reason);
                    return Ok(CrawlSummary {
                        reason,
                        pages_completed: counters.pages_completed,
                        pages_failed: counters.pages_failed,
                        epochs_started: counters.epochs_started,
                        links_skipped: counters.links_skipped,
                        articles: counters.articles,
                        final_cursor: self.store.cursor(),
                    });
                }
            };
        }
    }

    async fn fetch_page(&mut self, cursor: u32, counters: &mut RunCounters) -> CrawlState {
        if self.stop.is_stop_requested() {
            info!("Stop requested, not fetching page {cursor}");
            return CrawlState::Terminated(TerminationReason::Interrupted);
        }
        if let Some(max) = self.config.max_pages()
            && counters.pages_visited() >= max
        {
            info!("Reached page limit of {max}");
            return CrawlState::Terminated(TerminationReason::PageLimit);
        }

        let url = self.query.page_url(cursor, &self.store.filter());
        info!("Visiting page {cursor}: {url}");
        self.progress.report_page_started(cursor, &url);

        let document = match self.renderer.render(&url, &self.index_readiness).await {
            Ok(document) => document,
            Err(e) => {
                counters.pages_failed += 1;
                counters.consecutive_page_failures += 1;
                warn!(
                    "Index page {cursor} failed ({} in a row): {e}",
                    counters.consecutive_page_failures
                );
                self.progress.report_page_failed(cursor, &e.to_string());

                if counters.consecutive_page_failures >= self.config.max_consecutive_page_failures()
                {
                    return CrawlState::Terminated(TerminationReason::TooManyPageFailures);
                }
                self.store.advance();
                return CrawlState::FetchingPage {
                    cursor: self.store.cursor(),
                };
            }
        };
        counters.consecutive_page_failures = 0;

        let page = self.links.extract(&url, &document.html);
        if page.is_exhausted() {
            info!("No more articles found on page {cursor}");
            return CrawlState::Terminated(TerminationReason::Exhausted);
        }

        let bootstrap = (self.config.bootstrap_page() == Some(cursor))
            .then(|| self.links.latest_timestamp(&document.html));

        let listed = page.links.len();
        let mut seen = HashSet::with_capacity(listed);
        let links: Vec<String> = page
            .links
            .into_iter()
            .filter(|link| !self.store.is_processed(link) && seen.insert(link.clone()))
            .collect();
        counters.links_skipped += listed - links.len();

        debug!(
            "Page {cursor}: {} cards, {listed} links, {} new",
            page.cards_found,
            links.len()
        );
        self.progress.report_page_links(cursor, listed, links.len());

        CrawlState::DispatchingArticles {
            cursor,
            links,
            bootstrap,
        }
    }

    /// Run `links` through the article pipeline, at most `concurrency` at once.
    ///
    /// Results come back in the order of `links`.
    async fn dispatch(&self, links: Vec<String>) -> CrawlResult<Vec<ArticleResult>> {
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency()));
        let mut in_flight = FuturesUnordered::new();

        for (position, link) in links.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| CrawlError::WorkerPoolClosed)?;

            let renderer = Arc::clone(&self.renderer);
            let filter = Arc::clone(&self.filter);
            let saver = Arc::clone(&self.saver);
            let readiness = Arc::clone(&self.article_readiness);
            let task_link = link.clone();

            let task = tokio::spawn(async move {
                let _permit = permit; // Hold until task completes
                process_article(renderer.as_ref(), &filter, &saver, &readiness, &task_link).await
            });

            in_flight.push(async move {
                let outcome = match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Worker for {link} did not complete: {e}");
                        ArticleOutcome::Failed {
                            kind: FailureKind::Fetch,
                            error: format!("worker task failed: {e}"),
                        }
                    }
                };
                (position, ArticleResult { link, outcome })
            });
        }

        let mut results = Vec::with_capacity(in_flight.len());
        while let Some(result) = in_flight.next().await {
            results.push(result);
        }
        results.sort_by_key(|(position, _)| *position);
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }

    /// Merge one page's results and move the cursor on.
    ///
    /// State is flushed when the finished page number is a multiple of
    /// `flush_every_pages`, so a resumed run flushes on the same pages as an
    /// uninterrupted one.
    async fn drain(
        &mut self,
        cursor: u32,
        results: Vec<ArticleResult>,
        bootstrap: BootstrapProbe,
        counters: &mut RunCounters,
    ) -> CrawlResult<CrawlState> {
        self.merge(&results, &mut counters.articles).await?;
        counters.pages_completed += 1;

        let mut next = None;
        match bootstrap {
            Some(Ok(latest)) => {
                let filter = DateFilter::bootstrap_from(latest);
                self.store.start_epoch(filter);
                counters.epochs_started += 1;
                let epoch = self.store.epoch().epoch;
                info!("Bootstrap page {cursor}: newest release at {latest}, starting epoch {epoch} at {filter}");
                self.progress.report_epoch_started(epoch, &filter);

                if let Some(max) = self.config.max_epochs()
                    && counters.epochs_started >= max
                {
                    info!("Reached epoch limit of {max}");
                    next = Some(CrawlState::Terminated(TerminationReason::EpochLimit));
                }
            }
            Some(Err(e)) => {
                warn!("Could not read the newest timestamp on bootstrap page {cursor}: {e}");
                self.store.advance();
            }
            None => self.store.advance(),
        }

        if cursor % self.config.flush_every_pages() == 0 {
            self.flush_state().await?;
            self.progress.report_flushed(cursor);
        }

        Ok(next.unwrap_or(CrawlState::FetchingPage {
            cursor: self.store.cursor(),
        }))
    }

    /// Fold worker results into the stores.
    ///
    /// Saved and rejected links become processed and leave the retry queue;
    /// failed links are appended to the failure log and upserted in the queue.
    async fn merge(&mut self, results: &[ArticleResult], tally: &mut ArticleTally) -> CrawlResult<()> {
        let mut failed = Vec::new();
        for result in results {
            tally.record(&result.outcome);
            self.progress.report_article(result);

            match &result.outcome {
                ArticleOutcome::Failed { kind, .. } => {
                    let attempts = self.retry.record(&result.link, *kind);
                    debug!("{} failed at {kind} stage (attempt {attempts})", result.link);
                    failed.push(result.link.clone());
                }
                ArticleOutcome::Saved(_) | ArticleOutcome::Rejected { .. } => {
                    self.store.mark_processed(&result.link);
                    self.retry.remove(&result.link);
                }
            }
        }
        self.failures.append(&failed).await?;
        Ok(())
    }

    async fn replay_queue(&mut self) -> CrawlResult<ReplaySummary> {
        let max_attempts = self.config.max_replay_attempts();
        let mut summary = ReplaySummary::default();
        let mut links = Vec::new();

        for entry in self.retry.entries().to_vec() {
            if self.store.is_processed(&entry.link) {
                self.retry.remove(&entry.link);
                summary.already_processed += 1;
            } else if entry.attempt_count >= max_attempts {
                debug!(
                    "Not replaying {}: {} attempts already",
                    entry.link, entry.attempt_count
                );
                summary.exhausted += 1;
            } else {
                links.push(entry.link);
            }
        }

        summary.attempted = links.len();
        info!(
            "Replaying {} failed links ({} out of attempts, {} already processed)",
            summary.attempted, summary.exhausted, summary.already_processed
        );

        let results = self.dispatch(links).await?;
        self.merge(&results, &mut summary.articles).await?;
        summary.remaining = self.retry.len();
        Ok(summary)
    }

    async fn flush_state(&self) -> Result<(), StoreError> {
        self.store.flush().await?;
        self.retry.flush().await
    }
}

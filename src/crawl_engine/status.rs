//! Read-only view of persisted crawl state

use std::fmt;
use std::path::PathBuf;

use crate::config::CrawlConfig;
use crate::progress_store::{EpochState, FailureLog, ProgressStore, RetryQueue, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatus {
    pub state_dir: PathBuf,
    /// Next listing page
    pub cursor: u32,
    pub epoch: EpochState,
    pub processed: usize,
    pub retry_queued: usize,
    /// Queued entries that replay will no longer attempt
    pub retry_exhausted: usize,
    pub failures_logged: usize,
}

impl CrawlStatus {
    pub async fn load(config: &CrawlConfig) -> Result<Self, StoreError> {
        let state_dir = config.state_dir();
        let store = ProgressStore::open(state_dir.clone(), config.date_filter()).await?;
        let retry = RetryQueue::load(&state_dir).await?;
        let failures = FailureLog::new(&state_dir).read_all().await?;

        Ok(Self {
            cursor: store.cursor(),
            epoch: store.epoch(),
            processed: store.processed_len(),
            retry_queued: retry.len(),
            retry_exhausted: retry
                .entries()
                .iter()
                .filter(|e| e.attempt_count >= config.max_replay_attempts())
                .count(),
            failures_logged: failures.len(),
            state_dir,
        })
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state dir:       {}", self.state_dir.display())?;
        writeln!(f, "next page:       {}", self.cursor)?;
        writeln!(f, "epoch:           {} ({})", self.epoch.epoch, self.epoch.filter)?;
        writeln!(f, "processed links: {}", self.processed)?;
        writeln!(
            f,
            "retry queue:     {} ({} out of attempts)",
            self.retry_queued, self.retry_exhausted
        )?;
        write!(f, "failure log:     {} lines", self.failures_logged)
    }
}

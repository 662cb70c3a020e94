//! Durable crawl state: page cursor, epoch, processed links, failures
//!
//! Everything lives in one state directory. The cursor, processed set and
//! epoch are held in memory and flushed together; the failure log is
//! append-only and written through immediately.

pub mod failure_log;
pub mod retry_queue;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content_saver::write_atomic;
use crate::crawl_engine::DateFilter;

pub use failure_log::FailureLog;
pub use retry_queue::{FailureKind, RetryEntry, RetryQueue};

pub const CURSOR_FILE: &str = "current_page_count.txt";
pub const PROGRESS_FILE: &str = "progress.json";
pub const EPOCH_FILE: &str = "epoch.json";
pub const FAILED_LINKS_FILE: &str = "failed_links.txt";
pub const RETRY_QUEUE_FILE: &str = "retry_queue.json";

/// I/O or format problem with a state file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Read a state file, `None` when it does not exist yet
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) async fn write_state(path: &Path, content: Vec<u8>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    write_atomic(path, content)
        .await
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    path: &Path,
    raw: &str,
) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub(crate) fn to_json<T: Serialize>(path: &Path, value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(value).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Date filter a cursor belongs to, and how many times it was re-derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochState {
    pub filter: DateFilter,
    pub epoch: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    links: Vec<String>,
}

/// Cursor, epoch and processed-link set of one crawl
#[derive(Debug)]
pub struct ProgressStore {
    state_dir: PathBuf,
    cursor: u32,
    epoch: EpochState,
    /// Insertion order, as written to disk
    processed: Vec<String>,
    processed_index: HashSet<String>,
}

impl ProgressStore {
    /// Load state from `state_dir`.
    ///
    /// Missing files mean a fresh crawl: cursor 1, epoch 0 under
    /// `initial_filter`. A stored epoch wins over `initial_filter` so a
    /// restart resumes the filter the cursor was counted under.
    pub async fn open(
        state_dir: impl Into<PathBuf>,
        initial_filter: DateFilter,
    ) -> Result<Self, StoreError> {
        let state_dir = state_dir.into();

        let cursor_path = state_dir.join(CURSOR_FILE);
        let cursor = match read_optional(&cursor_path).await? {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|c| *c >= 1)
                .ok_or_else(|| StoreError::Corrupt {
                    path: cursor_path.clone(),
                    message: format!("expected a page number >= 1, found {:?}", raw.trim()),
                })?,
            None => 1,
        };

        let progress_path = state_dir.join(PROGRESS_FILE);
        let progress: ProgressFile = match read_optional(&progress_path).await? {
            Some(raw) => parse_json(&progress_path, &raw)?,
            None => ProgressFile::default(),
        };

        let epoch_path = state_dir.join(EPOCH_FILE);
        let epoch = match read_optional(&epoch_path).await? {
            Some(raw) => parse_json(&epoch_path, &raw)?,
            None => EpochState {
                filter: initial_filter,
                epoch: 0,
            },
        };

        let mut processed = Vec::with_capacity(progress.links.len());
        let mut processed_index = HashSet::with_capacity(progress.links.len());
        for link in progress.links {
            if processed_index.insert(link.clone()) {
                processed.push(link);
            }
        }

        info!(
            "Loaded crawl state from {}: page {cursor}, epoch {} ({}), {} processed links",
            state_dir.display(),
            epoch.epoch,
            epoch.filter,
            processed.len()
        );

        Ok(Self {
            state_dir,
            cursor,
            epoch,
            processed,
            processed_index,
        })
    }

    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Next listing page to fetch
    #[must_use]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    #[must_use]
    pub fn epoch(&self) -> EpochState {
        self.epoch
    }

    #[must_use]
    pub fn filter(&self) -> DateFilter {
        self.epoch.filter
    }

    #[must_use]
    pub fn is_processed(&self, link: &str) -> bool {
        self.processed_index.contains(link)
    }

    /// Record `link` as done. Returns `false` if it already was
    pub fn mark_processed(&mut self, link: &str) -> bool {
        if !self.processed_index.insert(link.to_string()) {
            return false;
        }
        self.processed.push(link.to_string());
        true
    }

    #[must_use]
    pub fn processed(&self) -> &[String] {
        &self.processed
    }

    #[must_use]
    pub fn processed_len(&self) -> usize {
        self.processed.len()
    }

    /// Move to the next listing page of the current epoch
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Adopt `filter` as a new epoch and restart paging at 1
    pub fn start_epoch(&mut self, filter: DateFilter) {
        self.epoch = EpochState {
            filter,
            epoch: self.epoch.epoch + 1,
        };
        self.cursor = 1;
    }

    /// Persist cursor, processed set and epoch.
    ///
    /// Each file is replaced atomically; the processed set is written before
    /// the cursor so a crash between the two never skips unrecorded links.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let progress_path = self.state_dir.join(PROGRESS_FILE);
        let progress = to_json(
            &progress_path,
            &ProgressFile {
                links: self.processed.clone(),
            },
        )?;
        write_state(&progress_path, progress).await?;

        let epoch_path = self.state_dir.join(EPOCH_FILE);
        let epoch = to_json(&epoch_path, &self.epoch)?;
        write_state(&epoch_path, epoch).await?;

        let cursor_path = self.state_dir.join(CURSOR_FILE);
        write_state(&cursor_path, self.cursor.to_string().into_bytes()).await?;

        debug!(
            "Flushed crawl state: page {}, epoch {}, {} processed links",
            self.cursor,
            self.epoch.epoch,
            self.processed.len()
        );
        Ok(())
    }
}

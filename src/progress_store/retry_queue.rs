//! Persisted queue of failed links awaiting replay
//!
//! One entry per link. A failure upserts the entry and bumps its attempt
//! count; a later success removes it.

use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{RETRY_QUEUE_FILE, StoreError, parse_json, read_optional, to_json, write_state};

/// Stage at which an article failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Fetch,
    Structure,
    Save,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Structure => "structure",
            Self::Save => "save",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryEntry {
    pub link: String,
    pub failure_kind: FailureKind,
    pub attempt_count: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RetryFile {
    entries: Vec<RetryEntry>,
}

#[derive(Debug)]
pub struct RetryQueue {
    path: PathBuf,
    entries: Vec<RetryEntry>,
}

impl RetryQueue {
    /// Load the queue from `state_dir`, empty if never written
    pub async fn load(state_dir: &Path) -> Result<Self, StoreError> {
        let path = state_dir.join(RETRY_QUEUE_FILE);
        let file: RetryFile = match read_optional(&path).await? {
            Some(raw) => parse_json(&path, &raw)?,
            None => RetryFile::default(),
        };
        Ok(Self {
            path,
            entries: file.entries,
        })
    }

    /// Record a failure of `link`; returns its attempt count afterwards
    pub fn record(&mut self, link: &str, kind: FailureKind) -> u32 {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.link == link) {
            entry.failure_kind = kind;
            entry.attempt_count += 1;
            return entry.attempt_count;
        }
        self.entries.push(RetryEntry {
            link: link.to_string(),
            failure_kind: kind,
            attempt_count: 1,
        });
        1
    }

    /// Drop `link` from the queue. Returns whether it was queued
    pub fn remove(&mut self, link: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.link != link);
        before != self.entries.len()
    }

    #[must_use]
    pub fn get(&self, link: &str) -> Option<&RetryEntry> {
        self.entries.iter().find(|e| e.link == link)
    }

    #[must_use]
    pub fn entries(&self) -> &[RetryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn flush(&self) -> Result<(), StoreError> {
        let bytes = to_json(
            &self.path,
            &RetryFile {
                entries: self.entries.clone(),
            },
        )?;
        write_state(&self.path, bytes).await?;
        debug!("Flushed retry queue: {} entries", self.entries.len());
        Ok(())
    }
}

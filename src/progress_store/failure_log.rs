//! Append-only list of links that failed, one per line

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use super::{FAILED_LINKS_FILE, StoreError, read_optional};

#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    #[must_use]
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(FAILED_LINKS_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `links` in order. A link failing again is appended again.
    pub async fn append(&self, links: &[String]) -> Result<(), StoreError> {
        if links.is_empty() {
            return Ok(());
        }
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;

        let mut buf = String::with_capacity(links.iter().map(|l| l.len() + 1).sum());
        for link in links {
            buf.push_str(link);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        Ok(())
    }

    /// Every logged failure, oldest first
    pub async fn read_all(&self) -> Result<Vec<String>, StoreError> {
        Ok(read_optional(&self.path)
            .await?
            .map(|raw| {
                raw.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default())
    }
}

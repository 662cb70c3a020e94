use std::path::{Path, PathBuf};

use thiserror::Error;

use super::atomic::write_atomic;
use crate::utils::article_slug;

/// Failure while persisting an accepted article
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write article {link} to {path}: {source}")]
    Write {
        link: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where an accepted article ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArticle {
    pub link: String,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Writes accepted article text as `<storage_dir>/<slug>.txt`
#[derive(Debug, Clone)]
pub struct ContentSaver {
    output_dir: PathBuf,
}

impl ContentSaver {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the article for `link` is (or would be) saved at
    #[must_use]
    pub fn path_for(&self, link: &str) -> PathBuf {
        self.output_dir.join(format!("{}.txt", article_slug(link)))
    }

    /// Save `text` verbatim (UTF-8) for `link`.
    ///
    /// Saving the same link twice overwrites the earlier file.
    pub async fn save(&self, link: &str, text: &str) -> Result<SavedArticle, SaveError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| SaveError::CreateDir {
                path: self.output_dir.clone(),
                source,
            })?;

        let path = self.path_for(link);
        write_atomic(&path, text.as_bytes().to_vec())
            .await
            .map_err(|source| SaveError::Write {
                link: link.to_string(),
                path: path.clone(),
                source,
            })?;

        log::info!("Saved article: {}", path.display());

        Ok(SavedArticle {
            link: link.to_string(),
            path,
            bytes: text.len(),
        })
    }
}

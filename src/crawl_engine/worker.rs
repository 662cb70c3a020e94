//! Article pipeline run by each worker task: render, filter, save

use log::{debug, warn};

use super::crawl_types::ArticleOutcome;
use crate::content_saver::ContentSaver;
use crate::fetch::{PageRenderer, Readiness};
use crate::page_extractor::{ArticleFilter, ArticleVerdict, StructureError};
use crate::progress_store::FailureKind;

/// Run one article link through the pipeline.
///
/// Never fails: every error becomes [`ArticleOutcome::Failed`] with the stage
/// it happened in.
pub async fn process_article<R: PageRenderer>(
    renderer: &R,
    filter: &ArticleFilter,
    saver: &ContentSaver,
    readiness: &Readiness,
    link: &str,
) -> ArticleOutcome {
    let document = match renderer.render(link, readiness).await {
        Ok(document) => document,
        Err(e) => {
            warn!("Error fetching article from {link}: {e}");
            return ArticleOutcome::Failed {
                kind: FailureKind::Fetch,
                error: e.to_string(),
            };
        }
    };

    // Parsed DOM is dropped before the next await
    let verdict = filter.evaluate(&document.html);

    match verdict {
        ArticleVerdict::Accepted { text, hits, template } => {
            debug!("Accepted {link}: {hits} keyword hits ({template})");
            match saver.save(link, &text).await {
                Ok(saved) => ArticleOutcome::Saved(saved),
                Err(e) => {
                    warn!("Failed to save {link}: {e}");
                    ArticleOutcome::Failed {
                        kind: FailureKind::Save,
                        error: e.to_string(),
                    }
                }
            }
        }
        ArticleVerdict::Rejected { hits } => {
            debug!("Rejected {link}: {hits} keyword hits");
            ArticleOutcome::Rejected { hits }
        }
        ArticleVerdict::ContentNotFound => {
            let error = StructureError::ContentNotFound {
                tried: filter.template_names(),
            };
            warn!("Main content not found for article at {link}: {error}");
            ArticleOutcome::Failed {
                kind: FailureKind::Structure,
                error: error.to_string(),
            }
        }
    }
}

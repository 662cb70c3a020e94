//! Structural extraction from rendered markup.
//!
//! Index pages yield article links ([`LinkExtractor`]); article pages yield a
//! keyword-filtered plain-text body ([`ArticleFilter`]). Both are pure
//! functions of the HTML string, so they run on the coordinator or a worker
//! without touching the browser.

pub mod article;
pub mod links;
pub mod templates;
pub mod text;

use scraper::Selector;
use thiserror::Error;

use crate::config::ConfigError;

pub use article::{ArticleFilter, ArticleVerdict, KeywordMatcher};
pub use links::{IndexPage, IndexSelectors, LinkExtractor};
pub use templates::{ExtractionTemplate, default_templates};
pub use text::extract_text;

/// Expected sub-structure absent from a rendered page
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("no content template matched (tried: {tried})")]
    ContentNotFound { tried: String },

    #[error("no listing timestamp found")]
    MissingTimestamp,

    #[error("unparseable listing timestamp {raw:?}: {message}")]
    BadTimestamp { raw: String, message: String },
}

/// Parse a configured CSS selector
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

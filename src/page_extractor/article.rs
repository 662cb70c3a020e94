//! Article filter: locate the release body, extract text, apply keyword density

use regex::{Regex, RegexBuilder};
use scraper::Html;

use super::templates::{ExtractionTemplate, TemplateChain};
use super::text::extract_text;
use crate::config::{ConfigError, CrawlConfig};

/// Case-insensitive keyword counter.
///
/// Keywords are joined into one alternation with no word-boundary anchors,
/// so `VC` also matches inside `VCs` and `series` inside `miniseries`.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Regex,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, ConfigError> {
        let alternation = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");
        if alternation.is_empty() {
            return Err(ConfigError::InvalidKeywords("keyword list is empty".into()));
        }

        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidKeywords(e.to_string()))?;
        Ok(Self { pattern })
    }

    /// Non-overlapping matches in `text`
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }
}

/// What the filter decided about one article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleVerdict {
    /// Enough keyword hits; `text` is what gets saved
    Accepted {
        text: String,
        hits: usize,
        template: String,
    },
    /// Content found but below the keyword threshold
    Rejected { hits: usize },
    /// None of the templates matched
    ContentNotFound,
}

#[derive(Debug)]
pub struct ArticleFilter {
    templates: TemplateChain,
    keywords: KeywordMatcher,
    min_hits: usize,
}

impl ArticleFilter {
    pub fn new<S: AsRef<str>>(
        templates: &[ExtractionTemplate],
        keywords: &[S],
        min_hits: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            templates: TemplateChain::compile(templates)?,
            keywords: KeywordMatcher::new(keywords)?,
            min_hits,
        })
    }

    pub fn from_config(config: &CrawlConfig) -> Result<Self, ConfigError> {
        Self::new(config.templates(), config.keywords(), config.min_keyword_hits())
    }

    /// Comma-separated template names, for log lines
    #[must_use]
    pub fn template_names(&self) -> String {
        self.templates.names()
    }

    pub fn evaluate(&self, html: &str) -> ArticleVerdict {
        let doc = Html::parse_document(html);
        let Some((template, region)) = self.templates.locate(&doc) else {
            return ArticleVerdict::ContentNotFound;
        };

        let text = extract_text(region);
        let hits = self.keywords.count(&text);

        if hits >= self.min_hits {
            ArticleVerdict::Accepted {
                text,
                hits,
                template: template.name.clone(),
            }
        } else {
            ArticleVerdict::Rejected { hits }
        }
    }
}

//! Ordered content templates for article pages
//!
//! Release pages come in a few layouts. Each layout is a named CSS selector;
//! the first one that matches wins.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::compile_selector;
use crate::config::ConfigError;

/// A named selector locating the primary content region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionTemplate {
    pub name: String,
    pub selector: String,
}

impl ExtractionTemplate {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
        }
    }
}

/// Inline-gallery layout first, static-gallery layout second
#[must_use]
pub fn default_templates() -> Vec<ExtractionTemplate> {
    vec![
        ExtractionTemplate::new(
            "inline-gallery",
            "div#mm-0 div.page-wrap main#main article.news-release.inline-gallery-template",
        ),
        ExtractionTemplate::new(
            "static-gallery",
            "div#mm-0 div.page-wrap main#main article.news-release.static-gallery-template",
        ),
    ]
}

#[derive(Debug)]
pub(crate) struct CompiledTemplate {
    pub(crate) name: String,
    selector: Selector,
}

/// Templates compiled once, tried in order
#[derive(Debug)]
pub(crate) struct TemplateChain {
    templates: Vec<CompiledTemplate>,
}

impl TemplateChain {
    pub(crate) fn compile(templates: &[ExtractionTemplate]) -> Result<Self, ConfigError> {
        if templates.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one extraction template is required".into(),
            ));
        }
        let templates = templates
            .iter()
            .map(|t| {
                Ok(CompiledTemplate {
                    name: t.name.clone(),
                    selector: compile_selector(&t.selector)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { templates })
    }

    /// First template with a match, and the matched element
    pub(crate) fn locate<'a>(&self, doc: &'a Html) -> Option<(&CompiledTemplate, ElementRef<'a>)> {
        self.templates
            .iter()
            .find_map(|t| doc.select(&t.selector).next().map(|el| (t, el)))
    }

    pub(crate) fn names(&self) -> String {
        self.templates
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

//! Link extraction from index (listing) pages

use chrono::NaiveDateTime;
use log::warn;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use super::{StructureError, compile_selector};
use crate::config::{ConfigError, CrawlConfig};
use crate::utils::resolve_href;

/// CSS selectors describing a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSelectors {
    /// One news card per release
    pub card: String,
    /// Card body, searched within a card
    pub card_body: String,
    /// Anchor carrying the article href, searched within the card body
    pub link: String,
    /// Publication timestamp of a listed release, searched within the page
    pub timestamp: String,
}

impl Default for IndexSelectors {
    fn default() -> Self {
        Self {
            card: "div.row.newsCards[lang]".into(),
            card_body: "div.col-sm-12, div.card.col-view".into(),
            link: "a.newsreleaseconsolidatelink.display-outline.w-100".into(),
            timestamp: "div.row.newsCards[lang] h3 small".into(),
        }
    }
}

/// Links found on one index page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPage {
    /// Number of cards matched; zero means the listing is gone
    pub cards_found: usize,
    pub links: Vec<String>,
    /// Cards missing the expected body/anchor/href
    pub skipped_cards: usize,
}

impl IndexPage {
    /// No listing at all: the crawl has run past the last page
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cards_found == 0
    }
}

#[derive(Debug)]
pub struct LinkExtractor {
    card: Selector,
    card_body: Selector,
    link: Selector,
    timestamp: Selector,
    timestamp_format: String,
}

impl LinkExtractor {
    pub fn new(selectors: &IndexSelectors, timestamp_format: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            card: compile_selector(&selectors.card)?,
            card_body: compile_selector(&selectors.card_body)?,
            link: compile_selector(&selectors.link)?,
            timestamp: compile_selector(&selectors.timestamp)?,
            timestamp_format: timestamp_format.to_string(),
        })
    }

    pub fn from_config(config: &CrawlConfig) -> Result<Self, ConfigError> {
        Self::new(config.index_selectors(), config.timestamp_format())
    }

    /// Article links on the index page rendered from `page_url`.
    ///
    /// Relative hrefs are resolved against `page_url`. A malformed card is
    /// skipped with a warning; it never fails the page.
    pub fn extract(&self, page_url: &str, html: &str) -> IndexPage {
        let doc = Html::parse_document(html);
        let mut page = IndexPage::default();

        for card in doc.select(&self.card) {
            page.cards_found += 1;

            let href = card
                .select(&self.card_body)
                .next()
                .and_then(|body| body.select(&self.link).next())
                .and_then(|anchor| anchor.value().attr("href"));

            match href.and_then(|h| resolve_href(page_url, h)) {
                Some(link) => page.links.push(link),
                None => {
                    page.skipped_cards += 1;
                    warn!(
                        "Skipping news card #{} on {page_url}: missing body, anchor or href",
                        page.cards_found
                    );
                }
            }
        }

        page
    }

    /// Most recent publication time listed on the page.
    ///
    /// Timestamps look like `Oct 01, 2024, 17:30 ET`; the zone suffix is
    /// dropped before parsing with the configured format.
    pub fn latest_timestamp(&self, html: &str) -> Result<NaiveDateTime, StructureError> {
        let doc = Html::parse_document(html);
        let mut first_bad: Option<StructureError> = None;
        let mut latest: Option<NaiveDateTime> = None;

        for element in doc.select(&self.timestamp) {
            let raw = element.text().collect::<String>();
            let cleaned = strip_zone_suffix(raw.trim());
            match NaiveDateTime::parse_from_str(cleaned, &self.timestamp_format) {
                Ok(ts) => latest = Some(latest.map_or(ts, |cur| cur.max(ts))),
                Err(e) => {
                    first_bad.get_or_insert(StructureError::BadTimestamp {
                        raw: raw.trim().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        match (latest, first_bad) {
            (Some(ts), _) => Ok(ts),
            (None, Some(bad)) => Err(bad),
            (None, None) => Err(StructureError::MissingTimestamp),
        }
    }
}

fn strip_zone_suffix(raw: &str) -> &str {
    let trimmed = raw.trim_end();
    match trimmed.rsplit_once(' ') {
        Some((head, zone))
            if (2..=4).contains(&zone.len()) && zone.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            head.trim_end_matches([',', ' '])
        }
        _ => trimmed,
    }
}

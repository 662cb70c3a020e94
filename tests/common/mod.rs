//! Shared fixtures for the release_harvester test suite: an in-memory
//! renderer and HTML shaped like the real listing and article pages.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use scraper::{Html, Selector};
use release_harvester::config::{CrawlConfigBuilder, WithStorageDir};
use release_harvester::crawl_engine::{
    ArticleResult, DateFilter, IndexQuery, ProgressReporter, TerminationReason,
};
use release_harvester::{CrawlConfig, FetchError, PageRenderer, Readiness, RenderedDocument};

pub const BASE_URL: &str = "https://news.test/news-releases/list/";

/// Renderer answering from a URL → HTML table
#[derive(Default)]
pub struct MockRenderer {
    pages: Mutex<HashMap<String, Result<String, FetchError>>>,
    calls: Mutex<Vec<String>>,
    panics: Mutex<HashSet<String>>,
    releases: AtomicUsize,
    enforce_readiness: AtomicBool,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn page(&self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.lock().insert(url.into(), Ok(html.into()));
    }

    pub fn fail(&self, url: impl Into<String>, error: FetchError) {
        self.pages.lock().insert(url.into(), Err(error));
    }

    /// Rendering `url` panics, as a crashed worker would
    pub fn panic_on(&self, url: impl Into<String>) {
        self.panics.lock().insert(url.into());
    }

    /// Every URL rendered so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn times_rendered(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|u| *u == url).count()
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Check the readiness selector against each page the way Chromium
    /// does: a required selector that never matches is a timeout
    pub fn enforce_readiness(&self) {
        self.enforce_readiness.store(true, Ordering::SeqCst);
    }

    /// Every render sleeps this long before answering
    pub fn delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Most renders ever running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn lookup(&self, url: &str, readiness: &Readiness) -> Result<RenderedDocument, FetchError> {
        let timeout = || FetchError::Timeout {
            url: url.to_string(),
            operation: "readiness wait".into(),
            secs: readiness.timeout.as_secs(),
        };
        let html = match self.pages.lock().get(url).cloned() {
            Some(Ok(html)) => html,
            Some(Err(e)) => return Err(e),
            None => return Err(timeout()),
        };

        if self.enforce_readiness.load(Ordering::SeqCst) && readiness.required {
            let selector = Selector::parse(&readiness.selector).expect("valid readiness selector");
            if Html::parse_document(&html).select(&selector).next().is_none() {
                return Err(timeout());
            }
        }

        Ok(RenderedDocument {
            url: url.to_string(),
            html,
        })
    }
}

impl PageRenderer for MockRenderer {
    async fn render(
        &self,
        url: &str,
        readiness: &Readiness,
    ) -> Result<RenderedDocument, FetchError> {
        self.calls.lock().push(url.to_string());
        let should_panic = self.panics.lock().contains(url);
        if should_panic {
            panic!("renderer crashed on {url}");
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.lookup(url, readiness);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// What a [`RecordingProgress`] saw
#[derive(Default)]
pub struct ProgressLog {
    pub articles: Mutex<Vec<ArticleResult>>,
    pub epochs: Mutex<Vec<(u32, DateFilter)>>,
    pub terminations: Mutex<Vec<TerminationReason>>,
    pub flushes: Mutex<Vec<u32>>,
}

/// Reporter recording article outcomes, epochs, flushes and terminations
#[derive(Clone, Default)]
pub struct RecordingProgress(pub Arc<ProgressLog>);

impl ProgressReporter for RecordingProgress {
    fn report_page_started(&self, _cursor: u32, _url: &str) {}

    fn report_page_links(&self, _cursor: u32, _listed: usize, _dispatched: usize) {}

    fn report_page_failed(&self, _cursor: u32, _error: &str) {}

    fn report_article(&self, result: &ArticleResult) {
        self.0.articles.lock().push(result.clone());
    }

    fn report_epoch_started(&self, epoch: u32, filter: &DateFilter) {
        self.0.epochs.lock().push((epoch, *filter));
    }

    fn report_flushed(&self, cursor: u32) {
        self.0.flushes.lock().push(cursor);
    }

    fn report_terminated(&self, reason: TerminationReason) {
        self.0.terminations.lock().push(reason);
    }
}

/// Builder pointed at the fake listing with small, fast settings
pub fn test_config(storage: &Path) -> CrawlConfigBuilder<WithStorageDir> {
    CrawlConfig::builder()
        .storage_dir(storage)
        .base_url(BASE_URL)
        .page_size(3)
        .concurrency(2)
}

pub fn index_url(page: u32, filter: &DateFilter) -> String {
    IndexQuery::new(BASE_URL, 3)
        .expect("valid base url")
        .page_url(page, filter)
}

pub fn article_url(slug: &str) -> String {
    format!("https://news.test/news-releases/{slug}.html")
}

/// Listing page with one card per `(href, timestamp)`
pub fn index_page_with_times<S: AsRef<str>>(cards: &[(S, &str)]) -> String {
    let cards: String = cards
        .iter()
        .map(|(href, stamp)| {
            let href = href.as_ref();
            format!(
                r#"<div class="row newsCards" lang="en-US">
                  <div class="card col-view">
                    <a class="newsreleaseconsolidatelink display-outline w-100" href="{href}">
                      <h3><small>{stamp}</small> Release headline</h3>
                    </a>
                  </div>
                </div>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="prncom prncom_news-releases prncom_news-releases_headline-listing">{cards}</div></body></html>"#
    )
}

pub fn index_page<S: AsRef<str>>(hrefs: &[S]) -> String {
    let cards: Vec<(&str, &str)> = hrefs
        .iter()
        .map(|href| (href.as_ref(), "Oct 01, 2024, 16:30 ET"))
        .collect();
    index_page_with_times(&cards)
}

/// Listing page past the last result
pub fn empty_index_page() -> String {
    r#"<html><body><div class="prncom prncom_news-releases prncom_news-releases_headline-listing">
       <p>No results found.</p></div></body></html>"#
        .to_string()
}

/// Article page using the inline-gallery layout
pub fn article_page(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        r#"<html><body><div id="mm-0"><div class="page-wrap"><main id="main">
           <article class="news-release inline-gallery-template">{body}
           <script>var venture = "round";</script></article>
           </main></div></div></body></html>"#
    )
}

/// Article page whose layout no template recognizes
pub fn unrecognized_article_page() -> String {
    r#"<html><body><div id="mm-0"><div class="page-wrap"><main id="main">
       <article class="news-release video-template"><p>venture round series</p></article>
       </main></div></div></body></html>"#
        .to_string()
}

/// `.txt` files directly under `dir`
pub fn saved_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|raw| raw.lines().map(String::from).collect())
        .unwrap_or_default()
}

pub fn processed_links(state_dir: &Path) -> Vec<String> {
    let raw = std::fs::read_to_string(state_dir.join("progress.json")).expect("progress.json");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid progress.json");
    value["links"]
        .as_array()
        .expect("links array")
        .iter()
        .map(|v| v.as_str().expect("string link").to_string())
        .collect()
}

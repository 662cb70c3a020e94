//! Fetch port: "render this URL and give me its markup"
//!
//! The crawl engine only ever talks to a [`PageRenderer`]. The production
//! implementation drives headless Chromium; tests substitute an in-memory one.

mod chromium;
mod page_timeout;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub use chromium::ChromiumRenderer;
pub use page_timeout::with_page_timeout;

/// Markup of a page after the browser finished loading it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub url: String,
    pub html: String,
}

/// Condition a render waits for before reading the DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    /// CSS selector expected to match at least one element
    pub selector: String,
    /// Upper bound for the wait
    pub timeout: Duration,
    /// Whether a wait that runs out is an error.
    ///
    /// Required waits fail with [`FetchError::Timeout`]; best-effort waits
    /// return whatever DOM is there once `timeout` elapses.
    pub required: bool,
}

impl Readiness {
    /// Wait whose selector must appear
    pub fn new(selector: impl Into<String>, timeout: Duration) -> Self {
        Self {
            selector: selector.into(),
            timeout,
            required: true,
        }
    }

    /// Wait that gives up quietly, for pages where the selector's absence is
    /// itself the answer (a listing past its last page)
    pub fn best_effort(selector: impl Into<String>, timeout: Duration) -> Self {
        Self {
            required: false,
            ..Self::new(selector, timeout)
        }
    }
}

/// Network or browser failure while rendering a page.
///
/// Never retried by the renderer itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("{operation} timed out after {secs}s for {url}")]
    Timeout {
        url: String,
        operation: String,
        secs: u64,
    },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("browser session already released")]
    Released,
}

/// Something that can turn a URL into rendered markup.
///
/// Implementations must tolerate concurrent `render` calls from several
/// workers: either each call gets an independent session (a fresh browser
/// tab) or the implementation synchronizes internally.
pub trait PageRenderer: Send + Sync + 'static {
    /// Load `url`, wait for `readiness`, and return the DOM as HTML.
    ///
    /// A best-effort [`Readiness`] that runs out still yields the DOM.
    fn render(
        &self,
        url: &str,
        readiness: &Readiness,
    ) -> impl Future<Output = Result<RenderedDocument, FetchError>> + Send;

    /// Release underlying resources (browser process, temp profile).
    ///
    /// Called exactly once by the engine on every exit path. Renders issued
    /// afterwards fail with [`FetchError::Released`].
    fn release(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

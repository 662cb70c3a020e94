//! Chromium-backed [`PageRenderer`]
//!
//! One browser process is shared by all workers; every render opens its own
//! tab, so concurrent renders never step on each other's navigation state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{FetchError, PageRenderer, Readiness, RenderedDocument, with_page_timeout};
use crate::browser_setup::{LaunchOptions, launch_browser};
use crate::config::CrawlConfig;

/// Interval between readiness probes
const READINESS_POLL: Duration = Duration::from_millis(250);

struct BrowserSession {
    browser: Option<Arc<Browser>>,
    handler: JoinHandle<()>,
    /// Set only when the profile dir was created by us
    temp_profile: Option<PathBuf>,
}

impl BrowserSession {
    fn remove_temp_profile(&mut self) {
        if let Some(path) = self.temp_profile.take() {
            debug!("Removing browser profile {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!("Failed to remove browser profile {}: {e}", path.display());
            }
        }
    }

    /// Close the browser, wait for the process, then stop the CDP handler.
    ///
    /// Order matters: the handler must outlive `close()`.
    async fn shutdown(mut self) {
        if let Some(browser) = self.browser.take() {
            match Arc::try_unwrap(browser) {
                Ok(mut browser) => {
                    if let Err(e) = browser.close().await {
                        warn!("Failed to close browser: {e}");
                    }
                    if let Err(e) = browser.wait().await {
                        warn!("Failed to wait for browser exit: {e}");
                    }
                }
                Err(shared) => warn!(
                    "Browser still has {} references, it will be killed on drop",
                    Arc::strong_count(&shared)
                ),
            }
        }
        self.handler.abort();
        self.remove_temp_profile();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        self.remove_temp_profile();
    }
}

/// Renders pages in headless Chromium
pub struct ChromiumRenderer {
    session: Mutex<Option<BrowserSession>>,
    page_load_timeout: Duration,
}

impl ChromiumRenderer {
    /// Launch a browser configured from `config`
    pub async fn launch(config: &CrawlConfig) -> anyhow::Result<Self> {
        let options = LaunchOptions {
            headless: config.headless(),
            user_data_dir: config.chrome_data_dir().cloned(),
            request_timeout: config.page_load_timeout(),
        };
        let launched = launch_browser(&options).await?;

        let session = BrowserSession {
            browser: Some(Arc::new(launched.browser)),
            handler: launched.handler,
            temp_profile: launched
                .owns_user_data_dir
                .then_some(launched.user_data_dir),
        };

        Ok(Self {
            session: Mutex::new(Some(session)),
            page_load_timeout: config.page_load_timeout(),
        })
    }

    fn browser(&self) -> Result<Arc<Browser>, FetchError> {
        self.session
            .lock()
            .as_ref()
            .and_then(|s| s.browser.clone())
            .ok_or(FetchError::Released)
    }

    async fn load(&self, page: &Page, url: &str, readiness: &Readiness) -> Result<String, FetchError> {
        with_page_timeout(
            async {
                page.goto(url).await.map_err(|e| FetchError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
                Ok(())
            },
            self.page_load_timeout,
            "page navigation",
            url,
        )
        .await?;

        let ready = with_page_timeout(
            async {
                loop {
                    if page.find_element(readiness.selector.as_str()).await.is_ok() {
                        return Ok(());
                    }
                    tokio::time::sleep(READINESS_POLL).await;
                }
            },
            readiness.timeout,
            "readiness wait",
            url,
        )
        .await;

        match ready {
            Ok(()) => {}
            Err(FetchError::Timeout { .. }) if !readiness.required => {
                debug!(
                    "{} never appeared on {url}, reading the DOM as is",
                    readiness.selector
                );
            }
            Err(e) => return Err(e),
        }

        page.content()
            .await
            .map_err(|e| FetchError::Browser(format!("reading DOM of {url}: {e}")))
    }
}

impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str, readiness: &Readiness) -> Result<RenderedDocument, FetchError> {
        let browser = self.browser()?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(format!("opening tab for {url}: {e}")))?;

        let result = self.load(&page, url, readiness).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close tab for {url}: {e}");
        }

        result.map(|html| RenderedDocument {
            url: url.to_string(),
            html,
        })
    }

    async fn release(&self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            info!("Releasing browser session");
            session.shutdown().await;
        }
    }
}

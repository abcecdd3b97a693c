// src/services/browser.rs

//! Page renderers used by the snapshot crawler.
//!
//! - `ChromeRenderer`: headless Chrome, one isolated browser context per visit
//! - `HttpRenderer`: plain GET of the server-rendered document

use std::sync::Arc;
#[cfg(feature = "chrome")]
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, RenderEngine};
use crate::utils::http;

/// Document captured for one URL together with the status it was served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub status: u16,
    pub html: String,
}

impl RenderedPage {
    pub fn new(status: u16, html: impl Into<String>) -> Self {
        Self {
            status,
            html: html.into(),
        }
    }
}

/// Captures the fully rendered document for one URL.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Visit `url` and return the serialized document. A non-2xx answer is
    /// not an error here; the caller decides which statuses it accepts.
    async fn render(&self, url: &str) -> Result<RenderedPage>;
}

/// Build the renderer selected in the configuration.
pub async fn renderer_for(config: &CrawlerConfig) -> Result<Arc<dyn PageRenderer>> {
    match config.engine {
        RenderEngine::Http => Ok(Arc::new(HttpRenderer::new(config)?)),
        #[cfg(feature = "chrome")]
        RenderEngine::Chrome => Ok(Arc::new(ChromeRenderer::launch(config).await?)),
        #[cfg(not(feature = "chrome"))]
        RenderEngine::Chrome => Err(AppError::config(
            "crawler.engine = \"chrome\" requires the `chrome` feature",
        )),
    }
}

/// Fetches documents over HTTP without running scripts.
pub struct HttpRenderer {
    client: reqwest::Client,
}

impl HttpRenderer {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
        })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let (status, body) = http::fetch_text_any_status(&self.client, url)
            .await
            .map_err(|e| AppError::navigation(url, e))?;
        Ok(RenderedPage::new(status, body))
    }
}

/// Headless Chrome renderer sharing one browser process across visits.
#[cfg(feature = "chrome")]
pub struct ChromeRenderer {
    browser: headless_chrome::Browser,
    /// Reads the document status, which the DevTools page API does not expose
    client: reqwest::Client,
    settle: Duration,
    timeout: Duration,
}

#[cfg(feature = "chrome")]
impl ChromeRenderer {
    /// Launch the browser process.
    pub async fn launch(config: &CrawlerConfig) -> Result<Self> {
        let sandbox = config.sandbox;
        let timeout = Duration::from_secs(config.timeout_secs);

        let browser = tokio::task::spawn_blocking(move || {
            headless_chrome::Browser::new(headless_chrome::LaunchOptions {
                headless: true,
                sandbox,
                idle_browser_timeout: timeout * 4,
                ..Default::default()
            })
        })
        .await
        .map_err(|e| AppError::config(format!("browser launch task failed: {e}")))?
        .map_err(|e| AppError::config(format!("failed to launch Chrome: {e}")))?;

        log::info!("Launched headless Chrome (sandbox: {})", sandbox);

        Ok(Self {
            browser,
            client: http::create_async_client(config)?,
            settle: Duration::from_millis(config.settle_ms),
            timeout,
        })
    }

    /// Blocking visit in a fresh incognito context.
    ///
    /// The tab is closed and the context disposed whether or not the visit
    /// succeeded.
    fn capture(
        browser: &headless_chrome::Browser,
        url: &str,
        settle: Duration,
        timeout: Duration,
    ) -> Result<String> {
        let context = browser
            .new_context()
            .map_err(|e| AppError::navigation(url, e))?;
        let outcome = match context.new_tab() {
            Ok(tab) => {
                let html = Self::visit(&tab, url, settle, timeout);
                if let Err(e) = tab.close(true) {
                    log::debug!("Failed to close tab for {}: {}", url, e);
                }
                html
            }
            Err(e) => Err(AppError::navigation(url, e)),
        };

        let dispose = headless_chrome::protocol::cdp::Target::DisposeBrowserContext {
            browser_context_id: context.get_id().to_string(),
        };
        if let Err(e) = browser.call_method(dispose) {
            log::debug!("Failed to dispose browser context for {}: {}", url, e);
        }
        outcome
    }

    fn visit(
        tab: &headless_chrome::Tab,
        url: &str,
        settle: Duration,
        timeout: Duration,
    ) -> Result<String> {
        tab.set_default_timeout(timeout);
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| AppError::navigation(url, e))?;

        // Load event fired; give client-side scripts a bounded moment
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }

        tab.get_content().map_err(|e| AppError::navigation(url, e))
    }
}

#[cfg(feature = "chrome")]
#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let status = http::fetch_status(&self.client, url)
            .await
            .map_err(|e| AppError::navigation(url, e))?;

        let browser = self.browser.clone();
        let url_owned = url.to_string();
        let settle = self.settle;
        let timeout = self.timeout;

        let html = tokio::task::spawn_blocking(move || {
            Self::capture(&browser, &url_owned, settle, timeout)
        })
        .await
        .map_err(|e| AppError::navigation(url, e))??;
        Ok(RenderedPage::new(status, html))
    }
}

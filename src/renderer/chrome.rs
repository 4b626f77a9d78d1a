//! Chromium-backed renderer via chromiumoxide.
//!
//! One `ChromeRenderer` owns one browser process; each `ChromeContext` wraps
//! a single CDP page. Contexts close their page on the explicit `close` path
//! and fall back to a spawned background close from `Drop`, so error paths
//! cannot leak pages.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::CrawlLimits;
use crate::error::{EngineError, Result};
use crate::extraction::scripts::{script_for, SHIM_JS};
use crate::renderer::{ExtractorId, NavigationResult, RenderContext, Renderer};

/// Renderer backed by a headless Chromium process.
pub struct ChromeRenderer {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_agent: String,
    settle_delay: Duration,
}

impl ChromeRenderer {
    /// Launch a headless browser. Failure here is fatal to the whole job.
    pub async fn launch(limits: &CrawlLimits) -> Result<Self> {
        let config = BrowserConfig::builder()
            .window_size(1366, 900)
            .args(vec![
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--hide-scrollbars",
            ])
            .build()
            .map_err(EngineError::Renderer)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Renderer(e.to_string()))?;

        // The handler must be polled for the CDP connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            user_agent: limits.user_agent.clone(),
            settle_delay: limits.settle_delay,
        })
    }

    /// Shut the browser down. Safe to call once at end of job.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Renderer(format!("new page: {e}")))?;
        if let Err(e) = page.set_user_agent(self.user_agent.as_str()).await {
            warn!(error = %e, "failed to set user agent");
        }
        Ok(Box::new(ChromeContext {
            page: Some(page),
            settle_delay: self.settle_delay,
            runtime: tokio::runtime::Handle::current(),
        }))
    }
}

/// A single CDP page with deterministic teardown.
pub struct ChromeContext {
    page: Option<Page>,
    settle_delay: Duration,
    runtime: tokio::runtime::Handle,
}

impl ChromeContext {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::Renderer("page already closed".into()))
    }
}

#[async_trait]
impl RenderContext for ChromeContext {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<NavigationResult> {
        let start = Instant::now();
        let page = self.page()?;

        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| EngineError::PageLoad {
                url: url.to_string(),
                reason: format!("navigation timed out after {} ms", timeout.as_millis()),
            })?
            .map_err(|e| EngineError::PageLoad {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        // Near-idle wait; a slow page that never settles is not an error.
        if tokio::time::timeout(timeout, page.wait_for_navigation())
            .await
            .is_err()
        {
            debug!(%url, "navigation never reached idle, continuing");
        }

        // Short settle delay covers lazy-loaded images below the first paint.
        tokio::time::sleep(self.settle_delay).await;

        if let Err(e) = page.evaluate(SHIM_JS).await {
            debug!(%url, error = %e, "helper shim injection failed");
        }

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn extract(&self, extractor: ExtractorId) -> Result<serde_json::Value> {
        let page = self.page()?;
        let result = page
            .evaluate(script_for(extractor))
            .await
            .map_err(|e| EngineError::Extraction(format!("{}: {e}", extractor.name())))?;
        result
            .into_value::<serde_json::Value>()
            .map_err(|e| EngineError::Extraction(format!("{}: {e}", extractor.name())))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let page = self.page()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();
        page.screenshot(params)
            .await
            .map_err(|e| EngineError::Extraction(format!("screenshot: {e}")))
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        if let Some(page) = self.page.take() {
            page.close()
                .await
                .map_err(|e| EngineError::Renderer(format!("page close: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for ChromeContext {
    fn drop(&mut self) {
        // Fallback path only; `close` is preferred. We cannot await in Drop,
        // so spawn the close and let the runtime finish it.
        if let Some(page) = self.page.take() {
            self.runtime.spawn(async move {
                if let Err(e) = page.close().await {
                    warn!(error = %e, "background page close failed");
                }
            });
        }
    }
}

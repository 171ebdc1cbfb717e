//! Chromium driver over the Chrome DevTools Protocol (feature `browser`).
//!
//! Handles are not cached: every call re-queries the handle's selector and
//! takes its n-th match, so a handle whose element left the DOM surfaces as
//! [`ProbeError::StaleElement`] instead of acting on a dead node.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::driver::{BrowserDriver, DriverConfig, ElementHandle, Key, Screenshot, Size};
use crate::locator::{Locator, Selector};
use crate::result::{ProbeError, ProbeResult};

const IS_DISPLAYED_JS: &str = "function() { \
    const style = window.getComputedStyle(this); \
    const rect = this.getBoundingClientRect(); \
    return style.display !== 'none' && style.visibility !== 'hidden' \
        && rect.width > 0 && rect.height > 0; }";

const IS_SELECTED_JS: &str = "function() { \
    return !!(this.checked || this.selected \
        || this.getAttribute('aria-checked') === 'true' \
        || this.getAttribute('aria-selected') === 'true'); }";

const RECT_JS: &str = "function() { \
    const rect = this.getBoundingClientRect(); \
    return JSON.stringify({ width: rect.width, height: rect.height }); }";

const VIEWPORT_JS: &str =
    "JSON.stringify({ width: window.innerWidth, height: window.innerHeight })";

/// Browser driver backed by a launched Chromium
#[derive(Debug)]
pub struct ChromiumDriver {
    config: DriverConfig,
    browser: Mutex<CdpBrowser>,
    page: Arc<Mutex<CdpPage>>,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page
    ///
    /// # Errors
    ///
    /// [`ProbeError::BrowserLaunch`] if the browser or page cannot be created.
    pub async fn launch(config: DriverConfig) -> ProbeResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: config.is_mobile,
                is_landscape: false,
                has_touch: config.is_mobile,
            })
            .request_timeout(config.navigation_timeout);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(ref ua) = config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }

        let cdp_config = builder.build().map_err(|message| ProbeError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProbeError::BrowserLaunch {
                message: e.to_string(),
            })?;

        info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            mobile = config.is_mobile,
            "chromium launched"
        );

        Ok(Self {
            config,
            browser: Mutex::new(browser),
            page: Arc::new(Mutex::new(page)),
            handler,
        })
    }

    /// Launch configuration
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    async fn query(page: &CdpPage, selector: &Selector) -> ProbeResult<Vec<Element>> {
        let found = match selector.to_css() {
            Some(css) => page.find_elements(css).await,
            None => page.find_xpaths(selector.value()).await,
        };
        found.map_err(|e| ProbeError::driver(format!("query {selector} failed: {e}")))
    }

    async fn resolve(page: &CdpPage, handle: &ElementHandle) -> ProbeResult<Element> {
        Self::query(page, &handle.selector)
            .await?
            .into_iter()
            .nth(handle.index)
            .ok_or_else(|| ProbeError::StaleElement {
                id: handle.id.clone(),
            })
    }

    async fn call_fn<T: DeserializeOwned>(element: &Element, function: &str) -> ProbeResult<T> {
        let returns = element
            .call_js_fn(function, false)
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?;
        let value = returns
            .result
            .value
            .ok_or_else(|| ProbeError::driver("script returned no value"))?;
        match value {
            serde_json::Value::String(json) => Ok(serde_json::from_str(&json)?),
            other => Ok(serde_json::from_value(other)?),
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn locate(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>> {
        let page = self.page.lock().await;
        let selector = locator.selector();
        let elements = Self::query(&page, selector).await?;
        debug!(%selector, matches = elements.len(), "locate");
        Ok((0..elements.len())
            .map(|index| ElementHandle::new(format!("{selector}#{index}"), selector.clone(), index))
            .collect())
    }

    async fn is_displayed(&self, handle: &ElementHandle) -> ProbeResult<bool> {
        let page = self.page.lock().await;
        let element = Self::resolve(&page, handle).await?;
        Self::call_fn(&element, IS_DISPLAYED_JS).await
    }

    async fn is_selected(&self, handle: &ElementHandle) -> ProbeResult<bool> {
        let page = self.page.lock().await;
        let element = Self::resolve(&page, handle).await?;
        Self::call_fn(&element, IS_SELECTED_JS).await
    }

    async fn click(&self, handle: &ElementHandle) -> ProbeResult<()> {
        let page = self.page.lock().await;
        let element = Self::resolve(&page, handle).await?;
        let _ = element
            .click()
            .await
            .map_err(|e| ProbeError::driver(format!("click {} failed: {e}", handle.id)))?;
        Ok(())
    }

    async fn send_keys(&self, handle: &ElementHandle, text: &str) -> ProbeResult<()> {
        let page = self.page.lock().await;
        let element = Self::resolve(&page, handle).await?;
        let to_driver = |e: chromiumoxide::error::CdpError| ProbeError::driver(e.to_string());
        let _ = element.focus().await.map_err(to_driver)?;

        let mut pending = String::new();
        for c in text.chars() {
            match Key::from_code_point(c) {
                Some(key) => {
                    if !pending.is_empty() {
                        let _ = element.type_str(&pending).await.map_err(to_driver)?;
                        pending.clear();
                    }
                    let _ = element.press_key(key.name()).await.map_err(to_driver)?;
                }
                None => pending.push(c),
            }
        }
        if !pending.is_empty() {
            let _ = element.type_str(&pending).await.map_err(to_driver)?;
        }
        Ok(())
    }

    async fn attribute(&self, handle: &ElementHandle, name: &str) -> ProbeResult<Option<String>> {
        let page = self.page.lock().await;
        let element = Self::resolve(&page, handle).await?;
        element
            .attribute(name)
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))
    }

    async fn text(&self, handle: &ElementHandle) -> ProbeResult<String> {
        let page = self.page.lock().await;
        let element = Self::resolve(&page, handle).await?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn element_size(&self, handle: &ElementHandle) -> ProbeResult<Size> {
        let page = self.page.lock().await;
        let element = Self::resolve(&page, handle).await?;
        Self::call_fn(&element, RECT_JS).await
    }

    async fn viewport_size(&self) -> ProbeResult<Size> {
        let page = self.page.lock().await;
        let json: String = page
            .evaluate(VIEWPORT_JS)
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?
            .into_value()
            .map_err(|e| ProbeError::driver(e.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let page = self.page.lock().await;
        let _ = page.goto(url).await.map_err(|e| ProbeError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn current_title(&self) -> ProbeResult<String> {
        let page = self.page.lock().await;
        let title = page
            .get_title()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?;
        Ok(title.unwrap_or_default())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        let page = self.page.lock().await;
        let url = page
            .url()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn capture_visual_snapshot(&self, label: &str) -> ProbeResult<Screenshot> {
        use base64::Engine;

        let page = self.page.lock().await;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = page
            .execute(params)
            .await
            .map_err(|e| ProbeError::Screenshot {
                message: e.to_string(),
            })?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| ProbeError::Screenshot {
                message: e.to_string(),
            })?;
        debug!(label, bytes = data.len(), "screenshot captured");
        Ok(Screenshot::new(label, data))
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut browser = self.browser.lock().await;
        let _ = browser.close().await.map_err(|e| ProbeError::BrowserLaunch {
            message: e.to_string(),
        })?;
        self.handler.abort();
        info!("chromium closed");
        Ok(())
    }
}

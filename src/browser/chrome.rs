//! Browser automation using chromiumoxide.

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{Driver, DriverError};
use crate::config::{BrowserSettings, PROFILE_DIR_ENV};

/// Error texts Chrome returns for nodes removed by a re-render
const STALE_MARKERS: [&str; 3] = [
    "No node with given id",
    "Could not find node with given id",
    "Cannot find context with specified id",
];

const IS_DISPLAYED_JS: &str = "function() {
    const style = window.getComputedStyle(this);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    return !!(this.offsetWidth || this.offsetHeight || this.getClientRects().length);
}";

const IS_ENABLED_JS: &str = "function() {
    return !this.disabled && this.getAttribute('aria-disabled') !== 'true';
}";

/// Chromium driven over CDP, one page for the whole run
pub struct ChromeDriver {
    browser: Mutex<Browser>,
    page: Page,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromeDriver {
    /// Launch a browser and open a blank page
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .disable_default_args()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--mute-audio")
            .window_size(1920, 1080);

        if settings.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        // Read once per session
        let profile_dir = resolve_profile_dir(
            settings.profile_dir.as_deref(),
            std::env::var_os(PROFILE_DIR_ENV),
        );
        match profile_dir {
            Some(dir) => {
                info!("Using browser profile at {}", dir.display());
                builder = builder.user_data_dir(dir);
            }
            None => info!("Using a fresh browser profile"),
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to launch browser: {}", e))?;

        // Handler task must keep running for the browser to work
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create new page: {}", e))?;

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handle,
        })
    }
}

/// Configured profile directory wins over the environment variable
fn resolve_profile_dir(configured: Option<&str>, env: Option<OsString>) -> Option<PathBuf> {
    configured
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| env.filter(|dir| !dir.is_empty()).map(PathBuf::from))
}

fn classify(err: CdpError) -> DriverError {
    let message = err.to_string();
    if STALE_MARKERS.iter().any(|marker| message.contains(marker)) {
        DriverError::StaleElement
    } else {
        DriverError::Browser(message)
    }
}

fn js_bool(value: Option<serde_json::Value>) -> bool {
    value.and_then(|v| v.as_bool()).unwrap_or(false)
}

#[async_trait]
impl Driver for ChromeDriver {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.page.goto(url).await.map_err(classify)?;
        self.page.wait_for_navigation().await.map_err(classify)?;
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>, DriverError> {
        self.page.find_elements(selector).await.map_err(classify)
    }

    async fn text(&self, element: &Element) -> Result<String, DriverError> {
        Ok(element.inner_text().await.map_err(classify)?.unwrap_or_default())
    }

    async fn attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        element.attribute(name).await.map_err(classify)
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool, DriverError> {
        let returns = element
            .call_js_fn(IS_DISPLAYED_JS, false)
            .await
            .map_err(classify)?;
        Ok(js_bool(returns.result.value))
    }

    async fn is_enabled(&self, element: &Element) -> Result<bool, DriverError> {
        let returns = element
            .call_js_fn(IS_ENABLED_JS, false)
            .await
            .map_err(classify)?;
        Ok(js_bool(returns.result.value))
    }

    async fn click(&self, element: &Element) -> Result<(), DriverError> {
        element.click().await.map_err(classify)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let result = self.browser.get_mut().close().await;
        self.handle.abort();
        result.map(|_| ()).map_err(classify)
    }
}

//! Browser session with timeout-bounded waits.
//!
//! Every lookup returns `Ok(None)` when the element is missing or a wait
//! runs out, and logs it. `Err` is reserved for failures the caller did not
//! plan for.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::{Driver, DriverError, RateLimiter};
use crate::config::BrowserSettings;

/// Single browser page shared by every extractor call
pub struct Session<D: Driver> {
    driver: D,
    timeout: Duration,
    poll_interval: Duration,
    limiter: Option<RateLimiter>,
}

impl<D: Driver> Session<D> {
    /// Session without navigation throttling
    pub fn new(driver: D, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            driver,
            timeout,
            poll_interval,
            limiter: None,
        }
    }

    pub fn from_settings(driver: D, settings: &BrowserSettings) -> Self {
        Self {
            limiter: RateLimiter::from_settings(settings),
            ..Self::new(driver, settings.timeout(), settings.poll_interval())
        }
    }

    /// Default bound for waits
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(test)]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Navigate to `url`, throttled by the rate limiter if one is set
    pub async fn goto(&self, url: &str) -> Result<(), DriverError> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        debug!("Navigating to {}", url);
        self.driver.goto(url).await
    }

    async fn first(&self, selector: &str) -> Result<Option<D::Element>, DriverError> {
        Ok(self.driver.query_all(selector).await?.into_iter().next())
    }

    /// All elements matching `selector`, without waiting
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<D::Element>, DriverError> {
        self.driver.query_all(selector).await
    }

    /// First element matching `selector`, without waiting
    pub async fn find_element(&self, selector: &str) -> Result<Option<D::Element>, DriverError> {
        let element = self.first(selector).await?;
        if element.is_none() {
            warn!("Element not found: {}", selector);
        }
        Ok(element)
    }

    /// Run `probe` until it yields a value or `timeout` passes.
    ///
    /// The probe always runs at least once. Errors from the probe end the
    /// wait immediately.
    pub async fn poll<T, F, Fut>(
        &self,
        timeout: Duration,
        mut probe: F,
    ) -> Result<Option<T>, DriverError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, DriverError>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(found) = probe().await? {
                return Ok(Some(found));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Wait until an element matching `selector` is present in the DOM
    pub async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<D::Element>, DriverError> {
        let found = self.poll(timeout, move || self.first(selector)).await?;
        if found.is_none() {
            warn!("Timed out after {:?} waiting for {}", timeout, selector);
        }
        Ok(found)
    }

    /// Wait until an element matching `selector` is displayed and enabled
    pub async fn wait_until_clickable(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<D::Element>, DriverError> {
        let found = self
            .poll(timeout, move || async move {
                let Some(element) = self.first(selector).await? else {
                    return Ok(None);
                };
                match self.is_clickable(&element).await {
                    Ok(true) => Ok(Some(element)),
                    Ok(false) | Err(DriverError::StaleElement) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;
        if found.is_none() {
            warn!("Timed out after {:?} waiting for clickable {}", timeout, selector);
        }
        Ok(found)
    }

    async fn is_clickable(&self, element: &D::Element) -> Result<bool, DriverError> {
        Ok(self.driver.is_displayed(element).await? && self.driver.is_enabled(element).await?)
    }

    /// Elements matching `selector` that are currently rendered
    pub async fn find_visible_elements(
        &self,
        selector: &str,
    ) -> Result<Vec<D::Element>, DriverError> {
        let mut visible = Vec::new();
        for element in self.driver.query_all(selector).await? {
            match self.driver.is_displayed(&element).await {
                Ok(true) => visible.push(element),
                // Re-rendered away between query and check
                Ok(false) | Err(DriverError::StaleElement) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(visible)
    }

    /// Wait until the first element matching `selector` has text containing
    /// `marker`, then re-fetch it and return its text.
    ///
    /// Stale handles seen while waiting are ignored.
    pub async fn wait_for_text_containing(
        &self,
        selector: &str,
        marker: &str,
        timeout: Duration,
    ) -> Result<Option<String>, DriverError> {
        let observed = self
            .poll(timeout, move || async move {
                let Some(element) = self.first(selector).await? else {
                    return Ok(None);
                };
                match self.driver.text(&element).await {
                    Ok(text) if text.contains(marker) => Ok(Some(text)),
                    Ok(_) | Err(DriverError::StaleElement) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;

        let Some(observed) = observed else {
            warn!("Timed out after {:?} waiting for '{}' in {}", timeout, marker, selector);
            return Ok(None);
        };

        // Re-rendered between the wait and the re-fetch: keep what was seen
        let Some(element) = self.first(selector).await? else {
            return Ok(Some(observed.trim().to_string()));
        };
        match self.text(Some(&element)).await {
            Ok(text) => Ok(Some(text)),
            Err(DriverError::StaleElement) => Ok(Some(observed.trim().to_string())),
            Err(e) => Err(e),
        }
    }

    /// Trimmed text of `element`, or an empty string when there is none
    pub async fn text(&self, element: Option<&D::Element>) -> Result<String, DriverError> {
        match element {
            Some(element) => Ok(self.driver.text(element).await?.trim().to_string()),
            None => Ok(String::new()),
        }
    }

    /// Attribute value, empty when the attribute is absent
    pub async fn attribute(&self, element: &D::Element, name: &str) -> Result<String, DriverError> {
        Ok(self.driver.attribute(element, name).await?.unwrap_or_default())
    }

    pub async fn click(&self, element: &D::Element) -> Result<(), DriverError> {
        self.driver.click(element).await
    }

    /// Close the browser; failures are logged, not returned
    pub async fn close(mut self) {
        if let Err(e) = self.driver.close().await {
            warn!("Failed to close browser: {}", e);
        }
    }
}

//! Browser automation.
//!
//! `Driver` is the seam to the real browser (chromiumoxide in production, a
//! scripted fake in tests). `Session` layers timeout-bounded waits on top of
//! it and is what the site extractors talk to.

pub mod chrome;
pub mod rate_limiter;
pub mod session;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

pub use chrome::ChromeDriver;
pub use rate_limiter::RateLimiter;
pub use session::Session;

/// Browser failures surfaced through the driver seam
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Element handle points at a node the page has since re-rendered
    #[error("stale element reference")]
    StaleElement,
    #[error("browser error: {0}")]
    Browser(String),
}

/// Minimal set of browser operations the scraper needs
#[async_trait]
pub trait Driver: Send + Sync {
    type Element: Send + Sync;

    /// Navigate the session's page to `url`
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// All elements currently matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>, DriverError>;

    /// Rendered text of the element
    async fn text(&self, element: &Self::Element) -> Result<String, DriverError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn is_displayed(&self, element: &Self::Element) -> Result<bool, DriverError>;

    async fn is_enabled(&self, element: &Self::Element) -> Result<bool, DriverError>;

    async fn click(&self, element: &Self::Element) -> Result<(), DriverError>;

    /// Shut the browser down
    async fn close(&mut self) -> Result<(), DriverError>;
}

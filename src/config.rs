//! Configuration for the course scraper.
//!
//! Selectors are coupling points to live site markup, so every one of them
//! can be overridden from a config file or the environment.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming a persistent browser profile directory
pub const PROFILE_DIR_ENV: &str = "BROWSER_PROFILE_DIR";

/// Browser session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Bound for every wait, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default)]
    pub chrome_executable: Option<String>,
    /// Falls back to `BROWSER_PROFILE_DIR` when unset
    #[serde(default)]
    pub profile_dir: Option<String>,
    /// 0 disables page-load throttling
    #[serde(default = "default_page_loads_per_minute")]
    pub page_loads_per_minute: u32,
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: f64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
}

fn default_timeout_secs() -> f64 {
    5.0
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_headless() -> bool {
    true
}

fn default_page_loads_per_minute() -> u32 {
    30
}

fn default_min_delay_secs() -> f64 {
    0.5
}

fn default_max_delay_secs() -> f64 {
    1.5
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            headless: default_headless(),
            chrome_executable: None,
            profile_dir: None,
            page_loads_per_minute: default_page_loads_per_minute(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl BrowserSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Udemy course page selectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdemySelectors {
    #[serde(default = "default_udemy_price")]
    pub price: String,
    #[serde(default = "default_udemy_with_discount")]
    pub with_discount: String,
    #[serde(default = "default_udemy_content_length")]
    pub content_length: String,
    /// Trailing text removed from the content length before parsing
    #[serde(default = "default_length_suffix")]
    pub length_suffix: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_udemy_price() -> String {
    ".sidebar-container--purchase-section--17KRp > div:nth-child(1) > div:nth-child(1) > div:nth-child(1) > div:nth-child(2) > div:nth-child(1) > div:nth-child(1) > div:nth-child(1) > span:nth-child(2) > span:nth-child(1)".to_string()
}

fn default_udemy_with_discount() -> String {
    ".sidebar-container--purchase-section--17KRp > div:nth-child(1) > div:nth-child(1) > div:nth-child(1) > div:nth-child(2) > div:nth-child(1) > div:nth-child(1) > div:nth-child(2) > div:nth-child(1) > span:nth-child(2) > s:nth-child(1) > span:nth-child(1)".to_string()
}

fn default_udemy_content_length() -> String {
    r#"[data-purpose="video-content-length"]"#.to_string()
}

fn default_length_suffix() -> String {
    " on-demand video".to_string()
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for UdemySelectors {
    fn default() -> Self {
        Self {
            price: default_udemy_price(),
            with_discount: default_udemy_with_discount(),
            content_length: default_udemy_content_length(),
            length_suffix: default_length_suffix(),
            currency: default_currency(),
        }
    }
}

impl UdemySelectors {
    /// CSS selectors by name, for validation
    pub fn selectors(&self) -> [(&'static str, &str); 3] {
        [
            ("price", self.price.as_str()),
            ("with_discount", self.with_discount.as_str()),
            ("content_length", self.content_length.as_str()),
        ]
    }
}

/// Coursera course page selectors and modal class fragments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseraSelectors {
    #[serde(default = "default_coursera_details")]
    pub course_details: String,
    #[serde(default = "default_coursera_enroll")]
    pub enroll_button: String,
    #[serde(default = "default_coursera_modal")]
    pub modal: String,
    #[serde(default = "default_coursera_next")]
    pub next_button: String,
    #[serde(default = "default_coursera_price")]
    pub price: String,
    /// Detail text starting with this carries the course duration
    #[serde(default = "default_approx_prefix")]
    pub approx_prefix: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_free_trial_modal")]
    pub free_trial_modal: String,
    #[serde(default = "default_subscription_modal")]
    pub subscription_modal: String,
    #[serde(default = "default_enroll_modal")]
    pub enroll_modal: String,
}

fn default_coursera_details() -> String {
    r#"[data-e2e="key-information"] div, .rc-ProductMetrics div"#.to_string()
}

fn default_coursera_enroll() -> String {
    r#"button[data-e2e="enroll-button"]"#.to_string()
}

fn default_coursera_modal() -> String {
    r#"div[role="dialog"]"#.to_string()
}

fn default_coursera_next() -> String {
    r#"div[role="dialog"] button[data-e2e="enroll-next-button"]"#.to_string()
}

fn default_coursera_price() -> String {
    r#"div[role="dialog"] [data-e2e="enroll-modal-price"]"#.to_string()
}

fn default_approx_prefix() -> String {
    "Approx".to_string()
}

fn default_free_trial_modal() -> String {
    "rc-FreeTrialModal".to_string()
}

fn default_subscription_modal() -> String {
    "rc-SubscriptionChoiceModal".to_string()
}

fn default_enroll_modal() -> String {
    "rc-EnrollChoiceModal".to_string()
}

impl Default for CourseraSelectors {
    fn default() -> Self {
        Self {
            course_details: default_coursera_details(),
            enroll_button: default_coursera_enroll(),
            modal: default_coursera_modal(),
            next_button: default_coursera_next(),
            price: default_coursera_price(),
            approx_prefix: default_approx_prefix(),
            currency: default_currency(),
            free_trial_modal: default_free_trial_modal(),
            subscription_modal: default_subscription_modal(),
            enroll_modal: default_enroll_modal(),
        }
    }
}

impl CourseraSelectors {
    /// CSS selectors by name, for validation
    pub fn selectors(&self) -> [(&'static str, &str); 5] {
        [
            ("course_details", self.course_details.as_str()),
            ("enroll_button", self.enroll_button.as_str()),
            ("modal", self.modal.as_str()),
            ("next_button", self.next_button.as_str()),
            ("price", self.price.as_str()),
        ]
    }

    /// Plain-text settings that must not be empty
    fn markers(&self) -> [(&'static str, &str); 5] {
        [
            ("approx_prefix", self.approx_prefix.as_str()),
            ("currency", self.currency.as_str()),
            ("free_trial_modal", self.free_trial_modal.as_str()),
            ("subscription_modal", self.subscription_modal.as_str()),
            ("enroll_modal", self.enroll_modal.as_str()),
        ]
    }
}

/// Input spreadsheet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_link_column")]
    pub link_column: String,
}

fn default_link_column() -> String {
    "Link".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            link_column: default_link_column(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub udemy: UdemySelectors,
    #[serde(default)]
    pub coursera: CourseraSelectors,
    #[serde(default)]
    pub input: InputConfig,
}

impl AppConfig {
    /// Load configuration from defaults, a config file and the environment.
    ///
    /// Without `path`, an optional `scraper.{toml,json,yaml}` in the working
    /// directory is picked up.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("scraper").required(false),
        };

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            // Override with environment variables (COURSE_SCRAPER_BROWSER__TIMEOUT_SECS, etc.)
            .add_source(
                config::Environment::with_prefix("COURSE_SCRAPER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check selectors and limits before any browser is launched.
    pub fn validate(&self) -> Result<()> {
        let browser = &self.browser;
        for (name, secs) in [
            ("timeout_secs", browser.timeout_secs),
            ("min_delay_secs", browser.min_delay_secs),
            ("max_delay_secs", browser.max_delay_secs),
        ] {
            // Rejects NaN, negative, infinite and overflowing values
            if Duration::try_from_secs_f64(secs).is_err() {
                bail!("browser.{} is not a valid duration: {}", name, secs);
            }
        }
        if browser.timeout_secs == 0.0 {
            bail!("browser.timeout_secs must be positive");
        }
        if browser.poll_interval_ms == 0 {
            bail!("browser.poll_interval_ms must be positive");
        }
        if browser.max_delay_secs < browser.min_delay_secs {
            bail!("browser delay range is invalid");
        }

        let udemy = self.udemy.selectors().map(|(name, sel)| ("udemy", name, sel));
        let coursera = self
            .coursera
            .selectors()
            .map(|(name, sel)| ("coursera", name, sel));
        for (site, name, selector) in udemy.into_iter().chain(coursera) {
            check_selector(site, name, selector)?;
        }

        if self.udemy.currency.is_empty() {
            bail!("udemy.currency must not be empty");
        }
        for (name, value) in self.coursera.markers() {
            if value.trim().is_empty() {
                bail!("coursera.{} must not be empty", name);
            }
        }
        if self.input.link_column.is_empty() {
            bail!("input.link_column must not be empty");
        }

        Ok(())
    }
}

fn check_selector(site: &str, name: &str, selector: &str) -> Result<()> {
    if selector.trim().is_empty() {
        bail!("{}.{} selector is empty", site, name);
    }
    scraper::Selector::parse(selector)
        .map_err(|e| anyhow::anyhow!("{}.{} is not a valid CSS selector: {:?}", site, name, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that call `load` read the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.browser.timeout(), Duration::from_secs(5));
        assert_eq!(config.input.link_column, "Link");
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = AppConfig::default();
        config.coursera.enroll_button = "button[data-e2e=".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("coursera.enroll_button"));
    }

    #[test]
    fn test_empty_selector_rejected() {
        let mut config = AppConfig::default();
        config.udemy.price = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("udemy.price"));
    }

    #[test]
    fn test_empty_modal_fragment_rejected() {
        let mut config = AppConfig::default();
        config.coursera.subscription_modal.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.browser.timeout_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unbounded_timeout_rejected() {
        let mut config = AppConfig::default();
        config.browser.timeout_secs = 1e30;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.browser.timeout_secs = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.browser.max_delay_secs = f64::INFINITY;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_delay_secs"));

        let mut config = AppConfig::default();
        config.browser.min_delay_secs = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_delay_range_rejected() {
        let mut config = AppConfig::default();
        config.browser.min_delay_secs = 2.0;
        config.browser.max_delay_secs = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper.toml");
        std::fs::write(
            &path,
            "[browser]\ntimeout_secs = 7\n\n[input]\nlink_column = \"FromFile\"\n",
        )
        .unwrap();

        std::env::set_var("COURSE_SCRAPER_BROWSER__TIMEOUT_SECS", "10");
        std::env::set_var("COURSE_SCRAPER_INPUT__LINK_COLUMN", "URL");
        let loaded = AppConfig::load(Some(path.as_path()));
        std::env::remove_var("COURSE_SCRAPER_BROWSER__TIMEOUT_SECS");
        std::env::remove_var("COURSE_SCRAPER_INPUT__LINK_COLUMN");

        let config = loaded.unwrap();
        assert_eq!(config.browser.timeout(), Duration::from_secs(10));
        assert_eq!(config.input.link_column, "URL");
        // Neither the file nor the environment touched these
        assert_eq!(config.browser.poll_interval_ms, 500);
        assert_eq!(config.udemy.currency, "$");
    }

    #[test]
    fn test_env_infinite_timeout_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("COURSE_SCRAPER_BROWSER__TIMEOUT_SECS", "inf");
        let loaded = AppConfig::load(None);
        std::env::remove_var("COURSE_SCRAPER_BROWSER__TIMEOUT_SECS");

        assert!(loaded.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper.toml");
        std::fs::write(
            &path,
            "[browser]\ntimeout_secs = 10\nheadless = false\n\n[input]\nlink_column = \"URL\"\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.browser.timeout(), Duration::from_secs(10));
        assert!(!config.browser.headless);
        assert_eq!(config.input.link_column, "URL");
        // Untouched sections keep their defaults
        assert_eq!(config.udemy.length_suffix, " on-demand video");
    }
}

use crate::common::constants::{CATALOG_URL, DETAIL_BASE_URL};
use crate::common::error::{CrawlerError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "crawler.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub catalog: CatalogConfig,
    pub detail: DetailConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: CATALOG_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetailConfig {
    pub base_url: String,
    pub webdriver_url: String,
    pub headless: bool,
    /// Bound on page load until the title is present
    pub navigation_timeout_ms: u64,
    /// Bound on a single click, lookup or text read
    pub interaction_timeout_ms: u64,
    /// Bound on the venue popup appearing after the click
    pub popup_timeout_ms: u64,
    /// HTTP timeout for a single WebDriver command
    pub command_timeout_ms: u64,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            base_url: DETAIL_BASE_URL.to_string(),
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            navigation_timeout_ms: 10_000,
            interaction_timeout_ms: 2_000,
            popup_timeout_ms: 2_000,
            command_timeout_ms: 15_000,
        }
    }
}

impl DetailConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn interaction_timeout(&self) -> Duration {
        Duration::from_millis(self.interaction_timeout_ms)
    }

    pub fn popup_timeout(&self) -> Duration {
        Duration::from_millis(self.popup_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}

impl CrawlerConfig {
    /// Reads the given file if it exists, then applies environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                CrawlerError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            toml::from_str(&content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            CrawlerConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CRAWLER_WEBDRIVER_URL") {
            self.detail.webdriver_url = url;
        }
        if let Ok(url) = std::env::var("CRAWLER_CATALOG_URL") {
            self.catalog.base_url = url;
        }
        if let Ok(url) = std::env::var("CRAWLER_DETAIL_URL") {
            self.detail.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(CrawlerError::Config("retry.max_attempts must be at least 1".into()));
        }
        let timeouts = [
            ("catalog.request_timeout_secs", self.catalog.request_timeout_secs),
            ("detail.navigation_timeout_ms", self.detail.navigation_timeout_ms),
            ("detail.interaction_timeout_ms", self.detail.interaction_timeout_ms),
            ("detail.popup_timeout_ms", self.detail.popup_timeout_ms),
            ("detail.command_timeout_ms", self.detail.command_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(CrawlerError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}

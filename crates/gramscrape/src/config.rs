//! Engine configuration.
//!
//! The query hashes and app id are tied to whatever the provider's web
//! client ships at the moment and go stale without notice. All of them can
//! be overridden from the environment.

use std::path::Path;

use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://www.instagram.com";
const DEFAULT_FEED_QUERY_HASH: &str = "472f257a40c653c64c666ce877d59d2b";
const DEFAULT_CONTINUATION_QUERY_HASH: &str = "e769aa130647d2354c40ea6a439bfc08";
const DEFAULT_APP_ID: &str = "936619743392459";

/// Errors while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Human-pacing delays between outbound calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub enabled: bool,
    /// Multiplier applied to every delay bound.
    pub scale: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scale: 1.0,
        }
    }
}

impl PacingConfig {
    /// No sleeping at all. Used by tests and one-off debugging runs.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            scale: 0.0,
        }
    }
}

/// Everything the engine needs to know about the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Scheme and host of the provider, without a trailing path.
    pub base_url: String,
    /// Versioned query identifier for the timeline feed query.
    pub feed_query_hash: String,
    /// Query identifier used to continue pagination after the public
    /// profile endpoint.
    pub continuation_query_hash: String,
    /// Value of the `X-IG-App-ID` header.
    pub app_id: String,
    /// Upper bound on the `first` variable of a feed query.
    pub max_page_size: usize,
    pub page_timeout_ms: u64,
    pub continuation_timeout_ms: u64,
    pub pacing: PacingConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            feed_query_hash: DEFAULT_FEED_QUERY_HASH.to_string(),
            continuation_query_hash: DEFAULT_CONTINUATION_QUERY_HASH.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            max_page_size: 50,
            page_timeout_ms: 10_000,
            continuation_timeout_ms: 15_000,
            pacing: PacingConfig::default(),
        }
    }
}

impl ScraperConfig {
    /// Defaults with `GRAMSCRAPE_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup, then validate.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GRAMSCRAPE_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("GRAMSCRAPE_FEED_QUERY_HASH") {
            self.feed_query_hash = v;
        }
        if let Some(v) = lookup("GRAMSCRAPE_CONTINUATION_QUERY_HASH") {
            self.continuation_query_hash = v;
        }
        if let Some(v) = lookup("GRAMSCRAPE_APP_ID") {
            self.app_id = v;
        }
        if let Some(v) = lookup("GRAMSCRAPE_MAX_PAGE_SIZE") {
            self.max_page_size = parse_number("GRAMSCRAPE_MAX_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("GRAMSCRAPE_PAGE_TIMEOUT_MS") {
            self.page_timeout_ms = parse_number("GRAMSCRAPE_PAGE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("GRAMSCRAPE_CONTINUATION_TIMEOUT_MS") {
            self.continuation_timeout_ms = parse_number("GRAMSCRAPE_CONTINUATION_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("GRAMSCRAPE_PACING") {
            self.pacing.enabled = !matches!(v.as_str(), "0" | "false" | "off");
        }
        if let Some(v) = lookup("GRAMSCRAPE_PACING_SCALE") {
            self.pacing.scale = v.parse().map_err(|_| ConfigError::Invalid {
                key: "GRAMSCRAPE_PACING_SCALE",
                message: format!("not a number: {v}"),
            })?;
        }
        self.validate()
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.base_url).map_err(|e| ConfigError::Invalid {
            key: "base_url",
            message: e.to_string(),
        })?;
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "max_page_size",
                message: "must be at least 1".to_string(),
            });
        }
        if !self.pacing.scale.is_finite() || self.pacing.scale < 0.0 {
            return Err(ConfigError::Invalid {
                key: "pacing.scale",
                message: format!("must be a non-negative number, got {}", self.pacing.scale),
            });
        }
        Ok(())
    }

    /// Builder-style override of the provider host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        message: format!("not a number: {value}"),
    })
}

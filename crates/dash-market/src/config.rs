//! Configuration for dashboard fetches and analytics

use crate::analytics::{DEFAULT_ATM_TOLERANCE, DEFAULT_VOLUME_WINDOW};
use crate::error::{DashError, Result};
use crate::model::Ticker;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Placeholder substituted with the ticker in URL templates
pub const TICKER_PLACEHOLDER: &str = "{ticker}";

/// History ranges understood by the quote adapter
pub const SUPPORTED_RANGES: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

const DEFAULT_NEWS_FEED_URL: &str =
    "https://feeds.finance.yahoo.com/rss/2.0/headline?s={ticker}&region=US&lang=en-US";
const DEFAULT_SEARCH_URL: &str = "https://www.reddit.com/search/?q={ticker}&sort=new";

/// Configuration for dashboard fetches and analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashConfig {
    /// Range of daily bars fetched for the price and volume panels
    pub history_range: String,

    /// Trailing window (in bars) of the average volume
    pub volume_window: usize,

    /// ATM band as a fraction of the current price
    pub atm_tolerance: f64,

    /// Maximum number of headlines shown
    pub news_limit: usize,

    /// RSS feed URL template, `{ticker}` is substituted
    pub news_feed_url: String,

    /// Search page URL template, `{ticker}` is substituted
    pub search_url: String,

    /// CSS selector of the headings counted as mentions
    pub heading_selector: String,

    /// User-Agent sent to the search page
    pub user_agent: String,

    /// Bounded wait for the search page fetch
    pub sentiment_timeout: Duration,

    /// Timeout for every other upstream call, none by default
    pub request_timeout: Option<Duration>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            history_range: "1mo".to_string(),
            volume_window: DEFAULT_VOLUME_WINDOW,
            atm_tolerance: DEFAULT_ATM_TOLERANCE,
            news_limit: 5,
            news_feed_url: DEFAULT_NEWS_FEED_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            heading_selector: "h3".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            sentiment_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

impl DashConfig {
    /// Create a new configuration builder
    pub fn builder() -> DashConfigBuilder {
        DashConfigBuilder::default()
    }

    /// Apply `TICKERDASH_*` environment overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(range) = std::env::var("TICKERDASH_HISTORY_RANGE") {
            self.history_range = range;
        }
        if let Ok(url) = std::env::var("TICKERDASH_NEWS_FEED_URL") {
            self.news_feed_url = url;
        }
        if let Ok(url) = std::env::var("TICKERDASH_SEARCH_URL") {
            self.search_url = url;
        }
        if let Ok(agent) = std::env::var("TICKERDASH_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Ok(secs) = std::env::var("TICKERDASH_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                DashError::ConfigError(format!(
                    "TICKERDASH_REQUEST_TIMEOUT_SECS must be an integer, got {secs}"
                ))
            })?;
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_RANGES.contains(&self.history_range.as_str()) {
            return Err(DashError::ConfigError(format!(
                "Unsupported history range: {}",
                self.history_range
            )));
        }

        if self.volume_window == 0 {
            return Err(DashError::ConfigError(
                "volume_window must be greater than 0".to_string(),
            ));
        }

        if !self.atm_tolerance.is_finite() || self.atm_tolerance < 0.0 {
            return Err(DashError::ConfigError(format!(
                "atm_tolerance must be a non-negative number, got {}",
                self.atm_tolerance
            )));
        }

        if self.news_limit == 0 {
            return Err(DashError::ConfigError(
                "news_limit must be greater than 0".to_string(),
            ));
        }

        if self.heading_selector.trim().is_empty() {
            return Err(DashError::ConfigError(
                "heading_selector must not be empty".to_string(),
            ));
        }

        for (name, template) in [
            ("news_feed_url", &self.news_feed_url),
            ("search_url", &self.search_url),
        ] {
            if !template.contains(TICKER_PLACEHOLDER) {
                return Err(DashError::ConfigError(format!(
                    "{name} must contain {TICKER_PLACEHOLDER}"
                )));
            }
            Url::parse(&template.replace(TICKER_PLACEHOLDER, "TEST")).map_err(|e| {
                DashError::ConfigError(format!("{name} is not a valid URL: {e}"))
            })?;
        }

        Ok(())
    }

    /// Feed URL for a ticker
    pub fn news_feed_url_for(&self, ticker: &Ticker) -> String {
        self.news_feed_url.replace(TICKER_PLACEHOLDER, ticker.as_str())
    }

    /// Search page URL for a ticker
    pub fn search_url_for(&self, ticker: &Ticker) -> String {
        self.search_url.replace(TICKER_PLACEHOLDER, ticker.as_str())
    }
}

/// Builder for DashConfig
#[derive(Debug, Default)]
pub struct DashConfigBuilder {
    history_range: Option<String>,
    volume_window: Option<usize>,
    atm_tolerance: Option<f64>,
    news_limit: Option<usize>,
    news_feed_url: Option<String>,
    search_url: Option<String>,
    heading_selector: Option<String>,
    user_agent: Option<String>,
    sentiment_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl DashConfigBuilder {
    /// Set the history range (e.g. "1mo", "3mo")
    pub fn history_range(mut self, range: impl Into<String>) -> Self {
        self.history_range = Some(range.into());
        self
    }

    /// Set the average volume window
    pub fn volume_window(mut self, window: usize) -> Self {
        self.volume_window = Some(window);
        self
    }

    /// Set the ATM tolerance fraction
    pub fn atm_tolerance(mut self, tolerance: f64) -> Self {
        self.atm_tolerance = Some(tolerance);
        self
    }

    /// Set the headline limit
    pub fn news_limit(mut self, limit: usize) -> Self {
        self.news_limit = Some(limit);
        self
    }

    /// Set the news feed URL template
    pub fn news_feed_url(mut self, url: impl Into<String>) -> Self {
        self.news_feed_url = Some(url.into());
        self
    }

    /// Set the search page URL template
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = Some(url.into());
        self
    }

    /// Set the heading selector
    pub fn heading_selector(mut self, selector: impl Into<String>) -> Self {
        self.heading_selector = Some(selector.into());
        self
    }

    /// Set the search page User-Agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the search page timeout
    pub fn sentiment_timeout(mut self, duration: Duration) -> Self {
        self.sentiment_timeout = Some(duration);
        self
    }

    /// Set a timeout for the other upstream calls
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DashConfig> {
        let defaults = DashConfig::default();

        let config = DashConfig {
            history_range: self.history_range.unwrap_or(defaults.history_range),
            volume_window: self.volume_window.unwrap_or(defaults.volume_window),
            atm_tolerance: self.atm_tolerance.unwrap_or(defaults.atm_tolerance),
            news_limit: self.news_limit.unwrap_or(defaults.news_limit),
            news_feed_url: self.news_feed_url.unwrap_or(defaults.news_feed_url),
            search_url: self.search_url.unwrap_or(defaults.search_url),
            heading_selector: self.heading_selector.unwrap_or(defaults.heading_selector),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            sentiment_timeout: self.sentiment_timeout.unwrap_or(defaults.sentiment_timeout),
            request_timeout: self.request_timeout.or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

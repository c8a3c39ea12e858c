//! Reddit search page fetcher

use crate::config::DashConfig;
use crate::error::{DashError, Result};
use crate::model::Ticker;
use crate::provider::SearchPage;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Fetches the public search results page of a ticker
///
/// Uses a browser-like User-Agent and the bounded sentiment timeout.
pub struct RedditSearch {
    client: reqwest::Client,
    config: Arc<DashConfig>,
}

impl RedditSearch {
    pub fn new(config: Arc<DashConfig>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.sentiment_timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(DashError::ScrapeError(format!(
            "Search page returned HTTP {status}"
        )))
    }
}

#[async_trait]
impl SearchPage for RedditSearch {
    async fn fetch_html(&self, ticker: &Ticker) -> Result<String> {
        let url = self.config.search_url_for(ticker);
        debug!("Fetching search page {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DashError::ScrapeError(format!("Search request failed: {e}")))?;

        check_status(response.status())?;

        response
            .text()
            .await
            .map_err(|e| DashError::ScrapeError(format!("Failed to read search page: {e}")))
    }
}

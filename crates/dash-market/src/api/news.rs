//! Yahoo Finance RSS headline feed

use crate::config::DashConfig;
use crate::error::{DashError, Result};
use crate::model::{HeadlineItem, Ticker};
use crate::provider::NewsFeed;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// RSS client for per-ticker headlines
pub struct YahooRssFeed {
    client: reqwest::Client,
    config: Arc<DashConfig>,
}

impl YahooRssFeed {
    /// Create a new feed client
    pub fn new(config: Arc<DashConfig>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }
}

/// Parse the first `limit` entries of an RSS document into headlines
///
/// Entries without a title or a link are skipped after the cut, so fewer
/// than `limit` headlines may come back.
pub fn parse_feed(bytes: &[u8], limit: usize) -> Result<Vec<HeadlineItem>> {
    let channel = rss::Channel::read_from(bytes)
        .map_err(|e| DashError::FeedError(format!("Failed to parse RSS: {e}")))?;

    Ok(channel
        .items()
        .iter()
        .take(limit)
        .filter_map(|item| {
            Some(HeadlineItem {
                title: item.title()?.trim().to_string(),
                link: item.link()?.trim().to_string(),
            })
        })
        .collect())
}

fn check_status(status: reqwest::StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(DashError::FeedError(format!("Feed returned HTTP {status}")))
    }
}

#[async_trait]
impl NewsFeed for YahooRssFeed {
    async fn entries(&self, ticker: &Ticker) -> Result<Vec<HeadlineItem>> {
        let url = self.config.news_feed_url_for(ticker);
        debug!("Fetching feed {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DashError::FeedError(format!("Feed request failed: {e}")))?;

        check_status(response.status())?;

        let bytes = response.bytes().await?;
        parse_feed(&bytes, self.config.news_limit)
    }
}

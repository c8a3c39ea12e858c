//! Boundary traits for the upstream collaborators
//!
//! Each panel talks to its data source through one of these traits so the
//! panel logic can be exercised without network access.

use crate::error::Result;
use crate::model::{
    CalendarRecord, HeadlineItem, HolderTable, OptionChain, PriceBar, QuoteInfo, ShortInterest,
    Ticker,
};
use async_trait::async_trait;

/// Market-data provider: prices, options, holders, calendar
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars over `range` (e.g. "1mo"), ascending by date
    async fn history(&self, ticker: &Ticker, range: &str) -> Result<Vec<PriceBar>>;

    /// Snapshot quote fields
    async fn quote_info(&self, ticker: &Ticker) -> Result<QuoteInfo>;

    /// Expiration dates as `YYYY-MM-DD`, nearest first
    async fn option_expirations(&self, ticker: &Ticker) -> Result<Vec<String>>;

    /// Calls and puts for one expiration
    async fn option_chain(&self, ticker: &Ticker, expiration: &str) -> Result<OptionChain>;

    /// Institutional holders, `None` when the provider has no such record
    async fn institutional_holders(&self, ticker: &Ticker) -> Result<Option<HolderTable>>;

    /// Major holders breakdown, `None` when the provider has no such record
    async fn major_holders(&self, ticker: &Ticker) -> Result<Option<HolderTable>>;

    /// Calendar record with the earnings date field
    async fn calendar(&self, ticker: &Ticker) -> Result<CalendarRecord>;

    /// Short interest statistics
    async fn short_interest(&self, ticker: &Ticker) -> Result<ShortInterest>;
}

/// Syndication feed of headlines
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsFeed: Send + Sync {
    /// The first `news_limit` feed entries in feed order, incomplete ones skipped
    async fn entries(&self, ticker: &Ticker) -> Result<Vec<HeadlineItem>>;
}

/// Public search page
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchPage: Send + Sync {
    /// Raw HTML of the search results for a ticker
    async fn fetch_html(&self, ticker: &Ticker) -> Result<String>;
}

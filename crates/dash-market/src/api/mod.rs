//! API clients for the upstream data sources

pub mod news;
pub mod reddit;
pub mod yahoo;

pub use news::{YahooRssFeed, parse_feed};
pub use reddit::RedditSearch;
pub use yahoo::YahooFinanceClient;

//! Market data and analytics behind the tickerdash dashboard
//!
//! This crate fetches everything the dashboard shows for one ticker and turns
//! it into panel-ready values:
//!
//! - Price history, quote snapshot, options chains, holders, earnings
//!   calendar and short interest from Yahoo Finance
//! - Headlines from the Yahoo Finance RSS feed
//! - A mention count scraped from the Reddit search page
//! - Options moneyness, mid prices, adjacent-strike changes and the
//!   put/call open interest ratio
//! - Volume spikes and an unofficial squeeze rating
//!
//! # Architecture
//!
//! Upstream sources sit behind the traits in [`provider`]. [`Dashboard`]
//! owns one implementation of each and exposes one method per panel; each
//! panel fetches fresh data and degrades on its own when a source fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use dash_market::{DashConfig, Dashboard, Ticker};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(DashConfig::default().with_env_overrides()?);
//!     let dashboard = Dashboard::with_default_sources(config)?;
//!
//!     let ticker = Ticker::parse("GME")?;
//!     if let dash_market::OptionsPanel::Ready(view) = dashboard.options(&ticker, None).await {
//!         println!("{}", view.analysis.annotation());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod provider;

// Re-export main types for convenience
pub use config::DashConfig;
pub use dashboard::{
    Dashboard, HolderFetch, HoldersReport, OptionsPanel, OptionsView, Overview, SqueezeReport,
    VolumeReport,
};
pub use error::{DashError, Result};
pub use model::{
    Chain, HeadlineItem, HolderTable, MentionCount, OptionContract, OptionSide, PriceBar,
    QuoteInfo, ShortInterest, Ticker,
};
pub use provider::{MarketDataProvider, NewsFeed, SearchPage};

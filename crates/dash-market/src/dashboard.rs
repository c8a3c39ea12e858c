//! Panel assembly
//!
//! Every panel is a fresh fetch-and-transform for one ticker. A failing
//! upstream call only degrades the panel that made it: errors are logged and
//! turned into panel-local states, never propagated to sibling panels.

use crate::analytics::{
    EarningsDate, OptionsAnalysis, SpikeLevel, SqueezeRating, VolumeRow, analyze_chains,
    count_mentions, latest_spike, normalize_earnings_date, volume_profile,
};
use crate::api::{RedditSearch, YahooFinanceClient, YahooRssFeed};
use crate::config::DashConfig;
use crate::error::Result;
use crate::model::{
    Chain, HeadlineItem, HolderTable, MentionCount, OptionSide, PriceBar, QuoteInfo,
    ShortInterest, Ticker,
};
use crate::provider::{MarketDataProvider, NewsFeed, SearchPage};
use std::sync::Arc;
use tracing::{info, warn};

/// Snapshot and price chart of the overview panel
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    /// Short name, the ticker when the provider has none
    pub name: String,
    pub quote: QuoteInfo,
    pub history: Vec<PriceBar>,
    /// Upstream failures that left parts of the panel empty
    pub warnings: Vec<String>,
}

/// Volume vs. trailing average and the latest spike
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeReport {
    pub rows: Vec<VolumeRow>,
    pub latest_spike: Option<f64>,
    pub level: SpikeLevel,
}

/// Volume spike combined with short interest
#[derive(Debug, Clone, PartialEq)]
pub struct SqueezeReport {
    pub volume: VolumeReport,
    /// `None` when the statistics could not be fetched
    pub short_interest: Option<ShortInterest>,
    pub rating: SqueezeRating,
}

/// Outcome of one holder table fetch
#[derive(Debug, Clone, PartialEq)]
pub enum HolderFetch {
    /// The provider returned a table, possibly with no rows
    Table(HolderTable),
    /// The provider has no such record for the ticker
    Absent,
    /// The request failed
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoldersReport {
    pub institutional: HolderFetch,
    pub major: HolderFetch,
}

/// Analysis of both chains of the selected expiration
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsView {
    pub expirations: Vec<String>,
    pub expiration: String,
    pub analysis: OptionsAnalysis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionsPanel {
    /// No expiration dates could be listed
    NoExpirations,
    /// A chain side is missing or empty for the selected expiration
    NoData {
        expirations: Vec<String>,
        expiration: String,
    },
    Ready(Box<OptionsView>),
}

/// Fetches and assembles every dashboard panel
pub struct Dashboard {
    market: Arc<dyn MarketDataProvider>,
    news: Arc<dyn NewsFeed>,
    search: Arc<dyn SearchPage>,
    config: Arc<DashConfig>,
}

impl Dashboard {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        news: Arc<dyn NewsFeed>,
        search: Arc<dyn SearchPage>,
        config: Arc<DashConfig>,
    ) -> Self {
        Self {
            market,
            news,
            search,
            config,
        }
    }

    /// Dashboard backed by Yahoo Finance, its RSS feed and Reddit search
    pub fn with_default_sources(config: Arc<DashConfig>) -> Result<Self> {
        info!("Creating dashboard with Yahoo Finance and Reddit sources");
        Ok(Self::new(
            Arc::new(YahooFinanceClient::new(&config)?),
            Arc::new(YahooRssFeed::new(Arc::clone(&config))?),
            Arc::new(RedditSearch::new(Arc::clone(&config))?),
            config,
        ))
    }

    /// Daily bars over the configured range
    pub async fn fetch_history(&self, ticker: &Ticker) -> Result<Vec<PriceBar>> {
        self.market.history(ticker, &self.config.history_range).await
    }

    /// Expiration dates, empty when they cannot be fetched
    pub async fn list_expirations(&self, ticker: &Ticker) -> Vec<String> {
        match self.market.option_expirations(ticker).await {
            Ok(expirations) => expirations,
            Err(e) => {
                warn!("Could not fetch expiration dates for {}: {}", ticker, e);
                Vec::new()
            }
        }
    }

    /// One side of a chain, `None` on failure or when it has no rows
    pub async fn fetch_chain(
        &self,
        ticker: &Ticker,
        expiration: &str,
        side: OptionSide,
    ) -> Option<Chain> {
        match self.market.option_chain(ticker, expiration).await {
            Ok(pair) => Some(pair.into_side(side)).filter(|chain| !chain.is_empty()),
            Err(e) => {
                warn!("Could not fetch {} chain for {} {}: {}", side, ticker, expiration, e);
                None
            }
        }
    }

    /// Regular market price, 0 when unknown
    pub async fn current_price(&self, ticker: &Ticker) -> f64 {
        match self.market.quote_info(ticker).await {
            Ok(quote) => quote.price.unwrap_or(0.0),
            Err(e) => {
                warn!("Could not fetch price for {}: {}", ticker, e);
                0.0
            }
        }
    }

    /// At most `news_limit` headlines, empty on any failure
    pub async fn fetch_headlines(&self, ticker: &Ticker) -> Vec<HeadlineItem> {
        match self.news.entries(ticker).await {
            Ok(mut items) => {
                items.truncate(self.config.news_limit);
                items
            }
            Err(e) => {
                warn!("Treating news feed for {} as empty: {}", ticker, e);
                Vec::new()
            }
        }
    }

    /// Headings on the search page mentioning the ticker
    pub async fn fetch_mentions(&self, ticker: &Ticker) -> MentionCount {
        let counted = match self.search.fetch_html(ticker).await {
            Ok(html) => count_mentions(&html, ticker, &self.config.heading_selector),
            Err(e) => Err(e),
        };
        match counted {
            Ok(count) => MentionCount::Count(count),
            Err(e) => {
                warn!("Mention count for {} failed: {}", ticker, e);
                MentionCount::Error(format!("Error: {e}"))
            }
        }
    }

    /// Next earnings date or one of its sentinels
    pub async fn earnings_date(&self, ticker: &Ticker) -> EarningsDate {
        match self.market.calendar(ticker).await {
            Ok(record) => normalize_earnings_date(&record),
            Err(e) => {
                warn!("Failed to get earnings date for {}: {}", ticker, e);
                EarningsDate::Error
            }
        }
    }

    pub async fn overview(&self, ticker: &Ticker) -> Overview {
        let mut warnings = Vec::new();

        let quote = self.market.quote_info(ticker).await.unwrap_or_else(|e| {
            warn!("Quote for {} unavailable: {}", ticker, e);
            warnings.push(format!("Quote data unavailable: {e}"));
            QuoteInfo::default()
        });

        let history = self.fetch_history(ticker).await.unwrap_or_else(|e| {
            warn!("History for {} unavailable: {}", ticker, e);
            warnings.push(format!("Price history unavailable: {e}"));
            Vec::new()
        });

        Overview {
            name: quote
                .short_name
                .clone()
                .unwrap_or_else(|| ticker.to_string()),
            quote,
            history,
            warnings,
        }
    }

    pub async fn volume(&self, ticker: &Ticker) -> Result<VolumeReport> {
        let history = self.fetch_history(ticker).await?;
        let rows = volume_profile(&history, self.config.volume_window)?;
        let latest_spike = latest_spike(&rows);

        Ok(VolumeReport {
            rows,
            latest_spike,
            level: SpikeLevel::classify(latest_spike),
        })
    }

    pub async fn squeeze(&self, ticker: &Ticker) -> Result<SqueezeReport> {
        let volume = self.volume(ticker).await?;

        let short_interest = match self.market.short_interest(ticker).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Short interest for {} unavailable: {}", ticker, e);
                None
            }
        };

        let rating = SqueezeRating::rate(
            volume.latest_spike,
            short_interest
                .as_ref()
                .and_then(|s| s.short_percent_of_float),
        );

        Ok(SqueezeReport {
            volume,
            short_interest,
            rating,
        })
    }

    pub async fn holders(&self, ticker: &Ticker) -> HoldersReport {
        let institutional = holder_fetch(
            "institutional holders",
            ticker,
            self.market.institutional_holders(ticker).await,
        );
        let major = holder_fetch(
            "major holders",
            ticker,
            self.market.major_holders(ticker).await,
        );
        HoldersReport {
            institutional,
            major,
        }
    }

    /// Options panel for `expiration`, or the nearest one when it is not listed
    pub async fn options(&self, ticker: &Ticker, expiration: Option<&str>) -> OptionsPanel {
        let expirations = self.list_expirations(ticker).await;
        let Some(first) = expirations.first() else {
            return OptionsPanel::NoExpirations;
        };

        let selected = match expiration {
            Some(requested) if expirations.iter().any(|e| e == requested) => requested.to_string(),
            Some(requested) => {
                warn!("Expiration {} not listed for {}, using {}", requested, ticker, first);
                first.clone()
            }
            None => first.clone(),
        };

        let calls = self.fetch_chain(ticker, &selected, OptionSide::Call).await;
        let puts = self.fetch_chain(ticker, &selected, OptionSide::Put).await;
        let current_price = self.current_price(ticker).await;

        let analysis = analyze_chains(
            calls.as_ref(),
            puts.as_ref(),
            current_price,
            self.config.atm_tolerance,
        );

        match analysis {
            Some(analysis) => OptionsPanel::Ready(Box::new(OptionsView {
                expirations,
                expiration: selected,
                analysis,
            })),
            None => OptionsPanel::NoData {
                expirations,
                expiration: selected,
            },
        }
    }
}

fn holder_fetch(what: &str, ticker: &Ticker, result: Result<Option<HolderTable>>) -> HolderFetch {
    match result {
        Ok(Some(table)) => HolderFetch::Table(table),
        Ok(None) => HolderFetch::Absent,
        Err(e) => {
            warn!("Error loading {} for {}: {}", what, ticker, e);
            HolderFetch::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Moneyness;
    use crate::error::DashError;
    use crate::model::{CalendarRecord, DateValue, EarningsDateField, OptionChain, OptionContract};
    use crate::provider::{MockMarketDataProvider, MockNewsFeed, MockSearchPage};
    use chrono::NaiveDate;

    fn gme() -> Ticker {
        Ticker::parse("GME").unwrap()
    }

    fn dashboard(
        market: MockMarketDataProvider,
        news: MockNewsFeed,
        search: MockSearchPage,
    ) -> Dashboard {
        Dashboard::new(
            Arc::new(market),
            Arc::new(news),
            Arc::new(search),
            Arc::new(DashConfig::default()),
        )
    }

    fn market_only(market: MockMarketDataProvider) -> Dashboard {
        dashboard(market, MockNewsFeed::new(), MockSearchPage::new())
    }

    fn upstream_down() -> DashError {
        DashError::YahooFinanceError("upstream down".to_string())
    }

    fn bars(volumes: &[u64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: 20.0,
                high: 21.0,
                low: 19.0,
                close: 20.5,
                volume,
            })
            .collect()
    }

    fn contract(strike: f64, open_interest: u64) -> OptionContract {
        OptionContract {
            strike,
            bid: Some(1.0),
            ask: Some(2.0),
            open_interest: Some(open_interest),
            volume: Some(10),
            ..Default::default()
        }
    }

    fn option_chain(expiration: &str, puts: Vec<OptionContract>) -> OptionChain {
        OptionChain {
            calls: Chain {
                expiration: expiration.to_string(),
                side: OptionSide::Call,
                contracts: vec![contract(95.0, 10), contract(100.0, 20), contract(105.0, 5)],
            },
            puts: Chain {
                expiration: expiration.to_string(),
                side: OptionSide::Put,
                contracts: puts,
            },
        }
    }

    fn expect_expirations(market: &mut MockMarketDataProvider) {
        market.expect_option_expirations().returning(|_| {
            Ok(vec!["2024-05-17".to_string(), "2024-05-24".to_string()])
        });
    }

    fn expect_price(market: &mut MockMarketDataProvider, price: f64) {
        market.expect_quote_info().returning(move |_| {
            Ok(QuoteInfo {
                price: Some(price),
                ..Default::default()
            })
        });
    }

    #[tokio::test]
    async fn test_options_panel_ready() {
        let mut market = MockMarketDataProvider::new();
        expect_expirations(&mut market);
        market
            .expect_option_chain()
            .withf(|_, expiration| expiration == "2024-05-17")
            .times(2)
            .returning(|_, exp| Ok(option_chain(exp, vec![contract(95.0, 70)])));
        expect_price(&mut market, 100.0);

        let panel = market_only(market).options(&gme(), None).await;
        let OptionsPanel::Ready(view) = panel else {
            panic!("expected a ready panel, got {panel:?}");
        };

        assert_eq!(view.expiration, "2024-05-17");
        assert_eq!(view.expirations.len(), 2);
        let categories: Vec<_> = view
            .analysis
            .side(OptionSide::Call)
            .map(|c| c.category)
            .collect();
        assert_eq!(categories, vec![Moneyness::Itm, Moneyness::Atm, Moneyness::Otm]);
        assert_eq!(view.analysis.total_call_oi, 35);
        assert!((view.analysis.put_call_ratio - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_options_panel_uses_requested_expiration() {
        let mut market = MockMarketDataProvider::new();
        expect_expirations(&mut market);
        market
            .expect_option_chain()
            .withf(|_, expiration| expiration == "2024-05-24")
            .times(2)
            .returning(|_, exp| Ok(option_chain(exp, vec![contract(95.0, 1)])));
        expect_price(&mut market, 100.0);

        let panel = market_only(market)
            .options(&gme(), Some("2024-05-24"))
            .await;
        assert!(matches!(panel, OptionsPanel::Ready(ref v) if v.expiration == "2024-05-24"));
    }

    #[tokio::test]
    async fn test_options_panel_falls_back_to_first_expiration() {
        let mut market = MockMarketDataProvider::new();
        expect_expirations(&mut market);
        market
            .expect_option_chain()
            .withf(|_, expiration| expiration == "2024-05-17")
            .times(2)
            .returning(|_, exp| Ok(option_chain(exp, vec![contract(95.0, 1)])));
        expect_price(&mut market, 100.0);

        let panel = market_only(market)
            .options(&gme(), Some("2031-01-17"))
            .await;
        assert!(matches!(panel, OptionsPanel::Ready(ref v) if v.expiration == "2024-05-17"));
    }

    #[tokio::test]
    async fn test_options_panel_empty_puts_is_no_data() {
        let mut market = MockMarketDataProvider::new();
        expect_expirations(&mut market);
        market
            .expect_option_chain()
            .returning(|_, exp| Ok(option_chain(exp, vec![])));
        expect_price(&mut market, 100.0);

        let panel = market_only(market).options(&gme(), None).await;
        assert_eq!(
            panel,
            OptionsPanel::NoData {
                expirations: vec!["2024-05-17".to_string(), "2024-05-24".to_string()],
                expiration: "2024-05-17".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_options_panel_without_expirations() {
        let mut market = MockMarketDataProvider::new();
        market
            .expect_option_expirations()
            .returning(|_| Err(upstream_down()));
        market.expect_option_chain().never();

        let panel = market_only(market).options(&gme(), None).await;
        assert_eq!(panel, OptionsPanel::NoExpirations);
    }

    #[tokio::test]
    async fn test_options_panel_unknown_price_has_no_atm() {
        let mut market = MockMarketDataProvider::new();
        expect_expirations(&mut market);
        market
            .expect_option_chain()
            .returning(|_, exp| Ok(option_chain(exp, vec![contract(95.0, 1)])));
        market.expect_quote_info().returning(|_| Err(upstream_down()));

        let OptionsPanel::Ready(view) = market_only(market).options(&gme(), None).await else {
            panic!("expected a ready panel");
        };
        assert_eq!(view.analysis.current_price, 0.0);
        assert!(
            view.analysis
                .contracts
                .iter()
                .all(|c| c.category == Moneyness::Otm)
        );
    }

    #[tokio::test]
    async fn test_holders_distinguish_absent_empty_and_failed() {
        let mut market = MockMarketDataProvider::new();
        market
            .expect_institutional_holders()
            .returning(|_| Ok(Some(HolderTable::default())));
        market.expect_major_holders().returning(|_| Ok(None));

        let report = market_only(market).holders(&gme()).await;
        assert_eq!(report.institutional, HolderFetch::Table(HolderTable::default()));
        assert_eq!(report.major, HolderFetch::Absent);

        let mut market = MockMarketDataProvider::new();
        market
            .expect_institutional_holders()
            .returning(|_| Err(upstream_down()));
        market.expect_major_holders().returning(|_| Ok(None));

        let report = market_only(market).holders(&gme()).await;
        assert!(matches!(report.institutional, HolderFetch::Failed(ref m) if m.contains("upstream down")));
        assert_eq!(report.major, HolderFetch::Absent);
    }

    #[tokio::test]
    async fn test_headlines_are_limited() {
        let mut news = MockNewsFeed::new();
        news.expect_entries().returning(|_| {
            Ok((0..8)
                .map(|i| HeadlineItem {
                    title: format!("Headline {i}"),
                    link: format!("https://finance.yahoo.com/news/{i}"),
                })
                .collect())
        });

        let dash = dashboard(MockMarketDataProvider::new(), news, MockSearchPage::new());
        let items = dash.fetch_headlines(&gme()).await;
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].title, "Headline 0");
        assert_eq!(items[4].title, "Headline 4");
    }

    #[tokio::test]
    async fn test_feed_failure_is_no_news() {
        let mut news = MockNewsFeed::new();
        news.expect_entries()
            .returning(|_| Err(DashError::FeedError("bad xml".to_string())));

        let dash = dashboard(MockMarketDataProvider::new(), news, MockSearchPage::new());
        assert!(dash.fetch_headlines(&gme()).await.is_empty());
    }

    #[tokio::test]
    async fn test_mentions() {
        let mut search = MockSearchPage::new();
        search.expect_fetch_html().returning(|_| {
            Ok("<h3>GME squeeze</h3><h3>gme again</h3><h3>bonds</h3>".to_string())
        });
        let dash = dashboard(MockMarketDataProvider::new(), MockNewsFeed::new(), search);
        assert_eq!(dash.fetch_mentions(&gme()).await, MentionCount::Count(2));

        let mut search = MockSearchPage::new();
        search
            .expect_fetch_html()
            .returning(|_| Err(DashError::ScrapeError("Search page returned HTTP 403".to_string())));
        let dash = dashboard(MockMarketDataProvider::new(), MockNewsFeed::new(), search);
        let MentionCount::Error(message) = dash.fetch_mentions(&gme()).await else {
            panic!("expected an error outcome");
        };
        assert!(message.starts_with("Error: "));
        assert!(message.contains("403"));
    }

    #[tokio::test]
    async fn test_earnings_date() {
        let mut market = MockMarketDataProvider::new();
        market.expect_calendar().returning(|_| {
            Ok(CalendarRecord {
                earnings_date: Some(EarningsDateField::List(vec![DateValue::Timestamp(
                    1_714_420_800,
                )])),
            })
        });
        assert_eq!(
            market_only(market).earnings_date(&gme()).await.to_string(),
            "2024-04-29"
        );

        let mut market = MockMarketDataProvider::new();
        market.expect_calendar().returning(|_| Err(upstream_down()));
        assert_eq!(
            market_only(market).earnings_date(&gme()).await,
            EarningsDate::Error
        );
    }

    #[tokio::test]
    async fn test_volume_with_short_history() {
        let mut market = MockMarketDataProvider::new();
        market
            .expect_history()
            .withf(|_, range| range == "1mo")
            .returning(|_, _| Ok(bars(&[100, 200, 300])));

        let report = market_only(market).volume(&gme()).await.unwrap();
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.latest_spike, None);
        assert_eq!(report.level, SpikeLevel::Low);
    }

    #[tokio::test]
    async fn test_volume_propagates_history_failure() {
        let mut market = MockMarketDataProvider::new();
        market.expect_history().returning(|_, _| Err(upstream_down()));
        assert!(market_only(market).volume(&gme()).await.is_err());
    }

    #[tokio::test]
    async fn test_squeeze_rating() {
        let mut volumes = vec![100; 9];
        volumes.push(1_000);

        let mut market = MockMarketDataProvider::new();
        let history = bars(&volumes);
        market
            .expect_history()
            .returning(move |_, _| Ok(history.clone()));
        market.expect_short_interest().returning(|_| {
            Ok(ShortInterest {
                short_percent_of_float: Some(25.4),
                days_to_cover: Some(3.2),
            })
        });

        let report = market_only(market).squeeze(&gme()).await.unwrap();
        assert_eq!(report.volume.level, SpikeLevel::High);
        assert_eq!(report.rating, SqueezeRating::High);
    }

    #[tokio::test]
    async fn test_squeeze_without_short_interest() {
        let mut volumes = vec![100; 9];
        volumes.push(1_000);

        let mut market = MockMarketDataProvider::new();
        let history = bars(&volumes);
        market
            .expect_history()
            .returning(move |_, _| Ok(history.clone()));
        market
            .expect_short_interest()
            .returning(|_| Err(upstream_down()));

        let report = market_only(market).squeeze(&gme()).await.unwrap();
        assert!(report.short_interest.is_none());
        assert_eq!(report.rating, SqueezeRating::Moderate);
    }

    #[tokio::test]
    async fn test_overview_degrades_per_field() {
        let mut market = MockMarketDataProvider::new();
        market.expect_quote_info().returning(|_| Err(upstream_down()));
        market
            .expect_history()
            .returning(|_, _| Ok(bars(&[1, 2, 3])));

        let overview = market_only(market).overview(&gme()).await;
        assert_eq!(overview.name, "GME");
        assert_eq!(overview.quote, QuoteInfo::default());
        assert_eq!(overview.history.len(), 3);
        assert_eq!(overview.warnings.len(), 1);
    }
}

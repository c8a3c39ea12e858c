//! Yahoo Finance API client
//!
//! Daily history goes through `yahoo_finance_api`. Quotes, option chains and
//! the quote-summary modules (holders, calendar, key statistics) are read
//! from the JSON endpoints directly. Those endpoints want a session cookie
//! and a crumb; when the handshake fails requests are still attempted
//! without one.

use crate::config::DashConfig;
use crate::error::{DashError, Result};
use crate::model::{
    CalendarRecord, Chain, DateValue, EarningsDateField, HolderTable, OptionChain, OptionContract,
    OptionSide, PriceBar, QuoteInfo, ShortInterest, Ticker,
};
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use dash_utils::format_thousands;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tracing::debug;
use yahoo_finance_api as yahoo;

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_URL: &str = "https://query2.finance.yahoo.com/v7/finance/quote";
const OPTIONS_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Yahoo Finance API client
pub struct YahooFinanceClient {
    client: reqwest::Client,
    crumb: OnceCell<Option<String>>,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(config: &DashConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(BROWSER_USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            crumb: OnceCell::new(),
        })
    }

    async fn fetch_crumb(&self) -> Result<String> {
        // Only sets the session cookie, the response itself is usually a 404
        if let Err(e) = self.client.get(COOKIE_URL).send().await {
            debug!("Cookie request failed: {}", e);
        }

        let crumb = self
            .client
            .get(CRUMB_URL)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if crumb.is_empty() || crumb.contains('<') {
            return Err(DashError::YahooFinanceError(
                "Crumb endpoint returned no crumb".to_string(),
            ));
        }
        Ok(crumb)
    }

    async fn crumb(&self) -> Option<String> {
        self.crumb
            .get_or_init(|| async {
                match self.fetch_crumb().await {
                    Ok(crumb) => Some(crumb),
                    Err(e) => {
                        debug!("Continuing without crumb: {}", e);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let mut query = query.to_vec();
        if let Some(crumb) = self.crumb().await {
            query.push(("crumb", crumb));
        }

        debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(DashError::YahooFinanceError(format!("HTTP {status} from {url}")));
        }

        response.json::<T>().await.map_err(|e| {
            DashError::YahooFinanceError(format!("Failed to parse response from {url}: {e}"))
        })
    }

    async fn options_result(&self, ticker: &Ticker, date: Option<i64>) -> Result<OptionsResult> {
        let url = format!("{OPTIONS_URL}/{ticker}");
        let query: Vec<(&str, String)> = date.map(|d| ("date", d.to_string())).into_iter().collect();
        let response: OptionsResponse = self.get_json(&url, &query).await?;
        first_result(ticker, response.option_chain.result, response.option_chain.error)
    }

    async fn summary(&self, ticker: &Ticker, modules: &str) -> Result<SummaryResult> {
        let url = format!("{SUMMARY_URL}/{ticker}");
        let response: SummaryResponse = self
            .get_json(&url, &[("modules", modules.to_string())])
            .await?;
        first_result(ticker, response.quote_summary.result, response.quote_summary.error)
    }

    /// Fetch daily bars between two instants
    pub async fn get_historical_quotes(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| DashError::YahooFinanceError(e.to_string()))?;

        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DashError::YahooFinanceError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DashError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(ticker.as_str(), start_odt, end_odt)
            .await
            .map_err(|e| DashError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| DashError::YahooFinanceError(e.to_string()))?;

        let mut bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PriceBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();
        bars.sort_by_key(|bar| bar.date);
        Ok(bars)
    }
}

/// Start and end instants of a named history range
pub fn range_bounds(range: &str, end: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = match range {
        "1d" => end - chrono::Duration::days(1),
        "5d" => end - chrono::Duration::days(5),
        "1mo" => end - chrono::Duration::days(30),
        "3mo" => end - chrono::Duration::days(90),
        "6mo" => end - chrono::Duration::days(180),
        "1y" => end - chrono::Duration::days(365),
        "2y" => end - chrono::Duration::days(730),
        "5y" => end - chrono::Duration::days(1825),
        "10y" => end - chrono::Duration::days(3650),
        "ytd" => NaiveDate::from_ymd_opt(end.year(), 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc())
            .ok_or_else(|| DashError::Other(format!("Invalid year start for {end}")))?,
        "max" => end - chrono::Duration::days(36500), // ~100 years
        _ => return Err(DashError::ConfigError(format!("Invalid range: {range}"))),
    };
    Ok((start, end))
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn history(&self, ticker: &Ticker, range: &str) -> Result<Vec<PriceBar>> {
        let (start, end) = range_bounds(range, Utc::now())?;
        self.get_historical_quotes(ticker, start, end).await
    }

    async fn quote_info(&self, ticker: &Ticker) -> Result<QuoteInfo> {
        let response: QuoteResponse = self
            .get_json(QUOTE_URL, &[("symbols", ticker.to_string())])
            .await?;
        let quote = first_result(
            ticker,
            response.quote_response.result,
            response.quote_response.error,
        )?;
        Ok(quote.into())
    }

    async fn option_expirations(&self, ticker: &Ticker) -> Result<Vec<String>> {
        let result = self.options_result(ticker, None).await?;
        Ok(result
            .expiration_dates
            .iter()
            .filter_map(|&ts| unix_to_date(ts))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect())
    }

    async fn option_chain(&self, ticker: &Ticker, expiration: &str) -> Result<OptionChain> {
        let date = NaiveDate::parse_from_str(expiration, "%Y-%m-%d")
            .map_err(|e| DashError::Other(format!("Invalid expiration {expiration}: {e}")))?;
        let timestamp = date
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc().timestamp())
            .ok_or_else(|| DashError::Other(format!("Invalid expiration {expiration}")))?;

        let result = self.options_result(ticker, Some(timestamp)).await?;
        Ok(result.into_chain(expiration))
    }

    async fn institutional_holders(&self, ticker: &Ticker) -> Result<Option<HolderTable>> {
        let summary = self.summary(ticker, "institutionOwnership").await?;
        Ok(summary.institution_ownership.map(institutional_table))
    }

    async fn major_holders(&self, ticker: &Ticker) -> Result<Option<HolderTable>> {
        let summary = self.summary(ticker, "majorHoldersBreakdown").await?;
        Ok(summary.major_holders_breakdown.map(major_table))
    }

    async fn calendar(&self, ticker: &Ticker) -> Result<CalendarRecord> {
        let summary = self.summary(ticker, "calendarEvents").await?;
        Ok(calendar_record(summary.calendar_events))
    }

    async fn short_interest(&self, ticker: &Ticker) -> Result<ShortInterest> {
        let summary = self.summary(ticker, "defaultKeyStatistics").await?;
        let stats = summary.default_key_statistics.unwrap_or_default();
        Ok(ShortInterest {
            short_percent_of_float: stats
                .short_percent_of_float
                .and_then(|v| v.raw)
                .map(|fraction| fraction * 100.0),
            days_to_cover: stats.short_ratio.and_then(|v| v.raw),
        })
    }
}

fn first_result<T>(ticker: &Ticker, result: Option<Vec<T>>, error: Option<ApiError>) -> Result<T> {
    if let Some(error) = error {
        return Err(DashError::YahooFinanceError(error.to_string()));
    }
    result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DashError::DataUnavailable {
            symbol: ticker.to_string(),
            reason: "Empty result".to_string(),
        })
}

fn unix_to_date(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    description: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("Unknown"),
            self.description.as_deref().unwrap_or("no description")
        )
    }
}

/// Formatted numeric field (`{"raw": 1.0, "fmt": "1.00"}`)
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
    fmt: Option<String>,
    #[serde(rename = "longFmt")]
    long_fmt: Option<String>,
}

impl RawValue {
    fn display(&self) -> String {
        self.long_fmt
            .clone()
            .or_else(|| self.fmt.clone())
            .or_else(|| self.raw.map(|r| r.to_string()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    quote_response: Envelope<QuotePayload>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<Vec<T>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotePayload {
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    market_cap: Option<f64>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
}

impl From<QuotePayload> for QuoteInfo {
    fn from(quote: QuotePayload) -> Self {
        Self {
            short_name: quote.short_name,
            price: quote.regular_market_price,
            market_cap: quote
                .market_cap
                .filter(|cap| cap.is_finite() && *cap >= 0.0)
                .map(|cap| cap.round() as u64),
            trailing_pe: quote.trailing_pe,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: Envelope<OptionsResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionsSet>,
}

#[derive(Debug, Default, Deserialize)]
struct OptionsSet {
    #[serde(default)]
    calls: Vec<ContractPayload>,
    #[serde(default)]
    puts: Vec<ContractPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractPayload {
    #[serde(default)]
    contract_symbol: String,
    strike: f64,
    last_price: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    open_interest: Option<u64>,
    volume: Option<u64>,
    implied_volatility: Option<f64>,
}

impl From<ContractPayload> for OptionContract {
    fn from(c: ContractPayload) -> Self {
        Self {
            contract_symbol: c.contract_symbol,
            strike: c.strike,
            last_price: c.last_price,
            bid: c.bid,
            ask: c.ask,
            open_interest: c.open_interest,
            volume: c.volume,
            implied_volatility: c.implied_volatility,
        }
    }
}

impl OptionsResult {
    fn into_chain(self, expiration: &str) -> OptionChain {
        let set = self.options.into_iter().next().unwrap_or_default();
        let build = |side: OptionSide, rows: Vec<ContractPayload>| Chain {
            expiration: expiration.to_string(),
            side,
            contracts: rows.into_iter().map(OptionContract::from).collect(),
        };
        OptionChain {
            calls: build(OptionSide::Call, set.calls),
            puts: build(OptionSide::Put, set.puts),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: Envelope<SummaryResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    institution_ownership: Option<InstitutionOwnership>,
    major_holders_breakdown: Option<MajorHoldersBreakdown>,
    calendar_events: Option<CalendarEvents>,
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstitutionOwnership {
    #[serde(default)]
    ownership_list: Vec<Ownership>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ownership {
    organization: Option<String>,
    report_date: Option<RawValue>,
    pct_held: Option<RawValue>,
    position: Option<RawValue>,
    value: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MajorHoldersBreakdown {
    insiders_percent_held: Option<RawValue>,
    institutions_percent_held: Option<RawValue>,
    institutions_float_percent_held: Option<RawValue>,
    institutions_count: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarEvents {
    earnings: Option<CalendarEarnings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEarnings {
    earnings_date: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    short_percent_of_float: Option<RawValue>,
    short_ratio: Option<RawValue>,
}

fn display_or_blank(value: Option<&RawValue>) -> String {
    value.map(RawValue::display).unwrap_or_default()
}

fn institutional_table(ownership: InstitutionOwnership) -> HolderTable {
    let rows = ownership
        .ownership_list
        .iter()
        .map(|holder| {
            let shares = holder.position.as_ref().map_or_else(String::new, |p| {
                p.raw
                    .filter(|r| r.is_finite() && *r >= 0.0)
                    .map_or_else(|| p.display(), |r| format_thousands(r as u64))
            });
            vec![
                holder.organization.clone().unwrap_or_default(),
                shares,
                holder
                    .report_date
                    .as_ref()
                    .and_then(|d| d.fmt.clone())
                    .unwrap_or_default(),
                display_or_blank(holder.pct_held.as_ref()),
                display_or_blank(holder.value.as_ref()),
            ]
        })
        .collect();

    HolderTable {
        columns: ["Holder", "Shares", "Date Reported", "% Out", "Value"]
            .map(String::from)
            .to_vec(),
        rows,
    }
}

fn major_table(breakdown: MajorHoldersBreakdown) -> HolderTable {
    let entries = [
        (breakdown.insiders_percent_held, "% of Shares Held by All Insider"),
        (breakdown.institutions_percent_held, "% of Shares Held by Institutions"),
        (
            breakdown.institutions_float_percent_held,
            "% of Float Held by Institutions",
        ),
        (breakdown.institutions_count, "Number of Institutions Holding Shares"),
    ];

    HolderTable {
        columns: vec!["Value".to_string(), "Breakdown".to_string()],
        rows: entries
            .into_iter()
            .filter_map(|(value, label)| value.map(|v| vec![v.display(), label.to_string()]))
            .collect(),
    }
}

fn date_value(value: &Value) -> DateValue {
    match value {
        Value::Object(map) => map
            .get("raw")
            .and_then(Value::as_i64)
            .map_or_else(|| DateValue::Other(value.to_string()), DateValue::Timestamp),
        Value::Number(n) => n
            .as_i64()
            .map_or_else(|| DateValue::Other(n.to_string()), DateValue::Timestamp),
        Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_or_else(|_| DateValue::Other(s.clone()), DateValue::Date),
        other => DateValue::Other(other.to_string()),
    }
}

fn calendar_record(events: Option<CalendarEvents>) -> CalendarRecord {
    let earnings_date = events
        .and_then(|e| e.earnings)
        .and_then(|e| e.earnings_date)
        .and_then(|value| match value {
            Value::Null => None,
            Value::Array(items) => Some(EarningsDateField::List(
                items.iter().map(date_value).collect(),
            )),
            other => Some(EarningsDateField::Single(date_value(&other))),
        });
    CalendarRecord { earnings_date }
}

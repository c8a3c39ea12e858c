//! Records exchanged between adapters, analytics and the rendering layer
//!
//! Upstream payloads have a loosely guaranteed shape, so every field a
//! provider may omit is an `Option` here. Nothing in this module is persisted:
//! values are rebuilt on every refresh.

use crate::error::{DashError, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static TICKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\^?[A-Z0-9][A-Z0-9.=\-]{0,11}$").expect("ticker pattern is a valid regex")
});

/// Equity ticker symbol, always uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Parse user input into a ticker
    ///
    /// Input is trimmed and uppercased before validation.
    pub fn parse(input: &str) -> Result<Self> {
        let symbol = input.trim().to_uppercase();
        if TICKER_PATTERN.is_match(&symbol) {
            Ok(Self(symbol))
        } else {
            Err(DashError::InvalidSymbol(input.trim().to_string()))
        }
    }

    /// The symbol as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One daily bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Snapshot fields of a quote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteInfo {
    pub short_name: Option<String>,
    /// Regular market price
    pub price: Option<f64>,
    pub market_cap: Option<u64>,
    pub trailing_pe: Option<f64>,
}

/// Side of an option chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSide {
    Call,
    Put,
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => f.write_str("Call"),
            Self::Put => f.write_str("Put"),
        }
    }
}

/// One row of an option chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub contract_symbol: String,
    pub strike: f64,
    pub last_price: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub open_interest: Option<u64>,
    pub volume: Option<u64>,
    pub implied_volatility: Option<f64>,
}

/// Contracts for one (ticker, expiration, side)
///
/// Row order is the order returned upstream, conventionally ascending strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub expiration: String,
    pub side: OptionSide,
    pub contracts: Vec<OptionContract>,
}

impl Chain {
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Sum of open interest, absent values count as zero
    pub fn total_open_interest(&self) -> u64 {
        self.contracts
            .iter()
            .map(|c| c.open_interest.unwrap_or(0))
            .sum()
    }
}

/// Both sides of a chain as returned by one upstream call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub calls: Chain,
    pub puts: Chain,
}

impl OptionChain {
    /// Take one side, consuming the pair
    pub fn into_side(self, side: OptionSide) -> Chain {
        match side {
            OptionSide::Call => self.calls,
            OptionSide::Put => self.puts,
        }
    }
}

/// Tabular holder data, kept as display strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HolderTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A news headline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineItem {
    pub title: String,
    pub link: String,
}

/// Outcome of the mention scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MentionCount {
    Count(usize),
    Error(String),
}

/// One earnings date value as found in a calendar record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DateValue {
    Date(NaiveDate),
    /// Unix seconds
    Timestamp(i64),
    /// Anything else, kept as its raw text
    Other(String),
}

/// Earnings date field, a single value or a list of candidates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EarningsDateField {
    Single(DateValue),
    List(Vec<DateValue>),
}

/// Calendar record of a ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub earnings_date: Option<EarningsDateField>,
}

/// Short interest statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortInterest {
    /// Percent of float sold short, in percent (25.4 means 25.4%)
    pub short_percent_of_float: Option<f64>,
    /// Short ratio in days
    pub days_to_cover: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(strike: f64, open_interest: Option<u64>) -> OptionContract {
        OptionContract {
            strike,
            open_interest,
            ..Default::default()
        }
    }

    #[test]
    fn test_ticker_parse_normalizes() {
        let ticker = Ticker::parse("  gme ").unwrap();
        assert_eq!(ticker.as_str(), "GME");
        assert_eq!(ticker.to_string(), "GME");

        assert!(Ticker::parse("BRK.B").is_ok());
        assert!(Ticker::parse("^GSPC").is_ok());
        assert!(Ticker::parse("EURUSD=X").is_ok());
    }

    #[test]
    fn test_ticker_parse_rejects_garbage() {
        assert!(Ticker::parse("").is_err());
        assert!(Ticker::parse("G M E").is_err());
        assert!(Ticker::parse("GME;DROP").is_err());
        assert!(Ticker::parse("ABCDEFGHIJKLMN").is_err());

        let err = Ticker::parse("a/b").unwrap_err();
        assert_eq!(err.to_string(), "Invalid symbol: a/b");
    }

    #[test]
    fn test_chain_total_open_interest_skips_missing() {
        let chain = Chain {
            expiration: "2024-05-17".to_string(),
            side: OptionSide::Call,
            contracts: vec![contract(10.0, Some(5)), contract(11.0, None), contract(12.0, Some(7))],
        };
        assert_eq!(chain.total_open_interest(), 12);
        assert_eq!(chain.len(), 3);
        assert!(!chain.is_empty());
    }

    #[test]
    fn test_option_chain_into_side() {
        let pair = OptionChain {
            calls: Chain {
                expiration: "2024-05-17".to_string(),
                side: OptionSide::Call,
                contracts: vec![contract(10.0, Some(1))],
            },
            puts: Chain {
                expiration: "2024-05-17".to_string(),
                side: OptionSide::Put,
                contracts: vec![],
            },
        };
        assert_eq!(pair.clone().into_side(OptionSide::Call).len(), 1);
        assert!(pair.into_side(OptionSide::Put).is_empty());
    }
}

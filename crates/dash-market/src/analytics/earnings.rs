//! Earnings date normalization
//!
//! The sentinel strings are part of what the earnings panel shows and are
//! kept verbatim.

use crate::model::{CalendarRecord, DateValue, EarningsDateField};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NOT_AVAILABLE: &str = "Earnings Date not available";
pub const UNSUPPORTED_FORMAT: &str = "Unsupported date format";
pub const LOOKUP_ERROR: &str = "Error";

/// Next earnings date, or why there is none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarningsDate {
    Date(NaiveDate),
    /// The calendar has no earnings date
    NotAvailable,
    /// The calendar has a value of an unexpected shape
    UnsupportedFormat,
    /// The calendar could not be fetched, or listed no candidates
    Error,
}

impl fmt::Display for EarningsDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
            Self::UnsupportedFormat => f.write_str(UNSUPPORTED_FORMAT),
            Self::Error => f.write_str(LOOKUP_ERROR),
        }
    }
}

fn normalize_value(value: &DateValue) -> EarningsDate {
    match value {
        DateValue::Date(date) => EarningsDate::Date(*date),
        DateValue::Timestamp(secs) => DateTime::from_timestamp(*secs, 0)
            .map_or(EarningsDate::UnsupportedFormat, |dt| {
                EarningsDate::Date(dt.date_naive())
            }),
        DateValue::Other(_) => EarningsDate::UnsupportedFormat,
    }
}

/// Pick the earnings date out of a calendar record
///
/// A list contributes its first element; an empty list is a lookup error.
pub fn normalize_earnings_date(record: &CalendarRecord) -> EarningsDate {
    match &record.earnings_date {
        None => EarningsDate::NotAvailable,
        Some(EarningsDateField::Single(value)) => normalize_value(value),
        Some(EarningsDateField::List(values)) => values
            .first()
            .map_or(EarningsDate::Error, normalize_value),
    }
}

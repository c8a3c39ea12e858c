//! Error types for market data operations

use thiserror::Error;

/// Errors raised by adapters and analytics
#[derive(Debug, Error)]
pub enum DashError {
    /// Invalid ticker symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// News feed could not be fetched or parsed
    #[error("Feed error: {0}")]
    FeedError(String),

    /// Search page could not be fetched or parsed
    #[error("Scrape error: {0}")]
    ScrapeError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for market data operations
pub type Result<T> = std::result::Result<T, DashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DashError::InvalidSymbol("G M E".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: G M E");

        let err = DashError::DataUnavailable {
            symbol: "GME".to_string(),
            reason: "No option chain".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for GME: No option chain");
    }

    #[test]
    fn test_upstream_error_display() {
        let err = DashError::FeedError("Feed returned HTTP 404 Not Found".to_string());
        assert_eq!(err.to_string(), "Feed error: Feed returned HTTP 404 Not Found");

        let err = DashError::ScrapeError("Search page returned HTTP 403 Forbidden".to_string());
        assert!(err.to_string().starts_with("Scrape error: "));
    }
}

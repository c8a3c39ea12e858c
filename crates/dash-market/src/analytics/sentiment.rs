//! Mention counting over a scraped search page
//!
//! This is a heuristic proxy for retail interest, not a sentiment signal.
//! It depends on the markup of a page nobody promises to keep stable: when
//! the layout changes the count quietly drops to zero.

use crate::error::{DashError, Result};
use crate::model::Ticker;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Count headings whose text contains the ticker, case-insensitively
pub fn count_mentions(html: &str, ticker: &Ticker, heading_selector: &str) -> Result<usize> {
    let selector = Selector::parse(heading_selector).map_err(|e| {
        DashError::ScrapeError(format!("Invalid heading selector {heading_selector:?}: {e:?}"))
    })?;
    let needle = ticker.as_str().to_uppercase();
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter(|heading| {
            heading
                .text()
                .collect::<String>()
                .to_uppercase()
                .contains(&needle)
        })
        .count())
}

/// Band of a mention count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MentionLevel {
    Strong,
    Moderate,
    Low,
}

impl MentionLevel {
    /// `> 10` is strong, `> 3` moderate, anything else low
    pub fn classify(count: usize) -> Self {
        if count > 10 {
            Self::Strong
        } else if count > 3 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for MentionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => f.write_str("Strong Reddit chatter!"),
            Self::Moderate => f.write_str("Moderate Reddit interest."),
            Self::Low => f.write_str("Low Reddit activity."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gme() -> Ticker {
        Ticker::parse("GME").unwrap()
    }

    #[test]
    fn test_counts_matching_headings() {
        let html = r"
            <html><body>
              <h3>GME to the moon</h3>
              <h3>Why I sold my gme shares</h3>
              <h3>Index funds are fine</h3>
            </body></html>";
        assert_eq!(count_mentions(html, &gme(), "h3").unwrap(), 2);
    }

    #[test]
    fn test_nested_heading_text_is_joined() {
        let html = "<h3><span>Thoughts on</span> <a>$GME</a></h3><p>GME</p>";
        assert_eq!(count_mentions(html, &gme(), "h3").unwrap(), 1);
    }

    #[test]
    fn test_changed_layout_degrades_to_zero() {
        let html = "<div class=\"post-title\">GME squeeze</div>";
        assert_eq!(count_mentions(html, &gme(), "h3").unwrap(), 0);
        assert_eq!(count_mentions("", &gme(), "h3").unwrap(), 0);
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let err = count_mentions("<h3>GME</h3>", &gme(), "h3[").unwrap_err();
        assert!(matches!(err, DashError::ScrapeError(_)));
    }

    #[test]
    fn test_mention_levels() {
        assert_eq!(MentionLevel::classify(11), MentionLevel::Strong);
        assert_eq!(MentionLevel::classify(10), MentionLevel::Moderate);
        assert_eq!(MentionLevel::classify(4), MentionLevel::Moderate);
        assert_eq!(MentionLevel::classify(3), MentionLevel::Low);
        assert_eq!(MentionLevel::classify(0), MentionLevel::Low);
    }
}

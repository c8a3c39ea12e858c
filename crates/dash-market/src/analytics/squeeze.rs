//! Unofficial short-squeeze rating

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short % of float above which a high spike counts as a squeeze setup
pub const SHORT_FLOAT_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqueezeRating {
    High,
    Moderate,
    Low,
}

impl SqueezeRating {
    /// Rate a volume spike together with short interest
    ///
    /// Missing short interest never satisfies the short-float condition.
    pub fn rate(spike: Option<f64>, short_percent_of_float: Option<f64>) -> Self {
        let heavily_shorted = short_percent_of_float.is_some_and(|s| s > SHORT_FLOAT_THRESHOLD);
        match spike {
            Some(s) if s > 3.0 && heavily_shorted => Self::High,
            Some(s) if s > 2.0 => Self::Moderate,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for SqueezeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("High Squeeze Potential"),
            Self::Moderate => f.write_str("Moderate Potential"),
            Self::Low => f.write_str("Low Squeeze Indicators"),
        }
    }
}

//! Trailing average volume and volume spike

use crate::error::{DashError, Result};
use crate::model::PriceBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use ta::{Next, indicators::SimpleMovingAverage};

/// Default trailing window of the average volume, in bars
pub const DEFAULT_VOLUME_WINDOW: usize = 10;

/// Volume of one bar next to its trailing average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRow {
    pub date: NaiveDate,
    pub volume: u64,
    /// Absent until `window` bars have been seen
    pub avg_volume: Option<f64>,
    /// `volume / avg_volume`
    pub spike: Option<f64>,
}

/// Compute the trailing simple moving average of volume for every bar
pub fn volume_profile(bars: &[PriceBar], window: usize) -> Result<Vec<VolumeRow>> {
    let mut sma = SimpleMovingAverage::new(window)
        .map_err(|e| DashError::ConfigError(format!("Invalid volume window {window}: {e:?}")))?;

    Ok(bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let average = sma.next(bar.volume as f64);
            let avg_volume = (i + 1 >= window).then_some(average);
            let spike = avg_volume
                .filter(|avg| *avg > 0.0)
                .map(|avg| bar.volume as f64 / avg);
            VolumeRow {
                date: bar.date,
                volume: bar.volume,
                avg_volume,
                spike,
            }
        })
        .collect())
}

/// Spike of the most recent bar
pub fn latest_spike(rows: &[VolumeRow]) -> Option<f64> {
    rows.last().and_then(|row| row.spike)
}

/// Band of a volume spike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpikeLevel {
    High,
    Moderate,
    Low,
}

impl SpikeLevel {
    /// `> 3` is high, `> 2` moderate, anything else (including unknown) low
    pub fn classify(spike: Option<f64>) -> Self {
        match spike {
            Some(s) if s > 3.0 => Self::High,
            Some(s) if s > 2.0 => Self::Moderate,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for SpikeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("High volume spike"),
            Self::Moderate => f.write_str("Moderate spike"),
            Self::Low => f.write_str("Low spike"),
        }
    }
}

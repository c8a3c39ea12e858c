//! Transformations over fetched market data

pub mod earnings;
pub mod options;
pub mod sentiment;
pub mod squeeze;
pub mod volume;

pub use earnings::{EarningsDate, normalize_earnings_date};
pub use options::{
    CategorizedContract, DEFAULT_ATM_TOLERANCE, Moneyness, OptionsAnalysis, analyze_chains,
    categorize, categorize_chain, mid_price, put_call_ratio,
};
pub use sentiment::{MentionLevel, count_mentions};
pub use squeeze::SqueezeRating;
pub use volume::{DEFAULT_VOLUME_WINDOW, SpikeLevel, VolumeRow, latest_spike, volume_profile};

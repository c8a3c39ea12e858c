//! Option chain categorization and open-interest aggregation
//!
//! Strikes are bucketed by their position relative to the current price:
//! within `price * tolerance` is ATM, below is ITM, above is OTM. The rule
//! does not look at the option side, so a put struck below the price is
//! labelled ITM just like a call. Both chains are bucketed the same way.

use crate::model::{Chain, OptionContract, OptionSide};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default ATM band as a fraction of the current price
pub const DEFAULT_ATM_TOLERANCE: f64 = 0.02;

/// Strike position relative to the current price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Moneyness {
    Itm,
    Atm,
    Otm,
}

impl Moneyness {
    pub fn label(self) -> &'static str {
        match self {
            Self::Itm => "ITM",
            Self::Atm => "ATM",
            Self::Otm => "OTM",
        }
    }
}

impl fmt::Display for Moneyness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket a strike against the current price
///
/// A price of 0 collapses the ATM band to nothing, so only a strike of
/// exactly 0 can be ATM.
pub fn categorize(strike: f64, current_price: f64, tolerance: f64) -> Moneyness {
    let band = current_price * tolerance;
    if (strike - current_price).abs() <= band {
        Moneyness::Atm
    } else if strike < current_price {
        Moneyness::Itm
    } else {
        Moneyness::Otm
    }
}

/// Average of bid and ask, absent if either quote is missing
pub fn mid_price(contract: &OptionContract) -> Option<f64> {
    match (contract.bid, contract.ask) {
        (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
        _ => None,
    }
}

/// `(curr - prev) / prev * 100`, absent when undefined
fn percent_change(prev: Option<u64>, curr: Option<u64>) -> Option<f64> {
    let (prev, curr) = (prev?, curr?);
    if prev == 0 {
        return None;
    }
    Some((curr as f64 - prev as f64) / prev as f64 * 100.0)
}

/// Option contract enriched for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedContract {
    pub contract: OptionContract,
    pub side: OptionSide,
    pub category: Moneyness,
    pub mid_price: Option<f64>,
    /// Change of open interest vs. the previous row of the same category
    pub oi_pct_change: Option<f64>,
    /// Change of volume vs. the previous row of the same category
    pub volume_pct_change: Option<f64>,
}

/// Categorize and enrich one chain
///
/// Percentage changes compare each row with the previous row of the same
/// category in the chain's existing order. The first row of each category
/// has none.
pub fn categorize_chain(
    chain: &Chain,
    current_price: f64,
    tolerance: f64,
) -> Vec<CategorizedContract> {
    let mut previous: HashMap<Moneyness, (Option<u64>, Option<u64>)> = HashMap::new();

    chain
        .contracts
        .iter()
        .map(|contract| {
            let category = categorize(contract.strike, current_price, tolerance);
            let (oi_pct_change, volume_pct_change) = match previous.get(&category) {
                Some(&(prev_oi, prev_volume)) => (
                    percent_change(prev_oi, contract.open_interest),
                    percent_change(prev_volume, contract.volume),
                ),
                None => (None, None),
            };
            previous.insert(category, (contract.open_interest, contract.volume));

            CategorizedContract {
                contract: contract.clone(),
                side: chain.side,
                category,
                mid_price: mid_price(contract),
                oi_pct_change,
                volume_pct_change,
            }
        })
        .collect()
}

/// Total put open interest over total call open interest, 0 without calls
pub fn put_call_ratio(total_call_oi: u64, total_put_oi: u64) -> f64 {
    if total_call_oi == 0 {
        0.0
    } else {
        total_put_oi as f64 / total_call_oi as f64
    }
}

/// Categorized view of both chains of one expiration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsAnalysis {
    pub expiration: String,
    pub current_price: f64,
    /// Calls followed by puts
    pub contracts: Vec<CategorizedContract>,
    pub total_call_oi: u64,
    pub total_put_oi: u64,
    pub put_call_ratio: f64,
}

impl OptionsAnalysis {
    /// Chart annotation text
    pub fn annotation(&self) -> String {
        format!("Put/Call Open Interest Ratio: {:.2}", self.put_call_ratio)
    }

    pub fn side(&self, side: OptionSide) -> impl Iterator<Item = &CategorizedContract> {
        self.contracts.iter().filter(move |c| c.side == side)
    }
}

/// Analyze both chains
///
/// Returns `None` when either chain is missing or empty: a ratio against an
/// empty side would read as a real zero.
pub fn analyze_chains(
    calls: Option<&Chain>,
    puts: Option<&Chain>,
    current_price: f64,
    tolerance: f64,
) -> Option<OptionsAnalysis> {
    let calls = calls.filter(|c| !c.is_empty())?;
    let puts = puts.filter(|p| !p.is_empty())?;

    let total_call_oi = calls.total_open_interest();
    let total_put_oi = puts.total_open_interest();

    let mut contracts = categorize_chain(calls, current_price, tolerance);
    contracts.extend(categorize_chain(puts, current_price, tolerance));

    Some(OptionsAnalysis {
        expiration: calls.expiration.clone(),
        current_price,
        contracts,
        total_call_oi,
        total_put_oi,
        put_call_ratio: put_call_ratio(total_call_oi, total_put_oi),
    })
}

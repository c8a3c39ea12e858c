//! Terminal rendering of dashboard panels

use crate::commands::SideFilter;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use dash_market::analytics::{CategorizedContract, EarningsDate, MentionLevel, Moneyness};
use dash_market::{
    HeadlineItem, HolderFetch, HoldersReport, MentionCount, OptionSide, OptionsPanel, Overview,
    Result, SqueezeReport, Ticker, VolumeReport,
};
use dash_utils::{format_decimal, format_percent, format_thousands};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR_WIDTH: usize = 40;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn heading(title: &str) -> String {
    format!("{title}\n{}\n", "=".repeat(title.chars().count()))
}

/// Chart color of a moneyness category
pub fn category_color(category: Moneyness) -> Color {
    match category {
        Moneyness::Atm => Color::Rgb {
            r: 255,
            g: 165,
            b: 0,
        },
        Moneyness::Itm => Color::Green,
        Moneyness::Otm => Color::Grey,
    }
}

/// One-line chart of a series, scaled between its minimum and maximum
pub fn sparkline(values: &[f64]) -> String {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                ' '
            } else if span <= 0.0 {
                SPARK_LEVELS[3]
            } else {
                let level = ((v - min) / span * 7.0).round() as usize;
                SPARK_LEVELS[level.min(7)]
            }
        })
        .collect()
}

/// Horizontal bar proportional to `value / max`, at least one cell when non-zero
pub fn bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let cells = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

pub fn render_overview(ticker: &Ticker, overview: &Overview) -> String {
    let mut out = heading(&format!("{} ({})", overview.name, ticker));

    let mut table = new_table(&["Price", "Market Cap", "P/E Ratio"]);
    table.add_row(vec![
        format_decimal(overview.quote.price, 2),
        format_thousands(overview.quote.market_cap.unwrap_or(0)),
        format_decimal(overview.quote.trailing_pe, 2),
    ]);
    out.push_str(&format!("{table}\n"));

    out.push_str("\nRecent Price Chart\n");
    match (overview.history.first(), overview.history.last()) {
        (Some(first), Some(last)) => {
            let closes: Vec<f64> = overview.history.iter().map(|b| b.close).collect();
            let low = closes.iter().copied().fold(f64::INFINITY, f64::min);
            let high = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            out.push_str(&format!("{}\n", sparkline(&closes)));
            out.push_str(&format!(
                "{} .. {}  low {:.2}  high {:.2}  last {:.2}\n",
                first.date, last.date, low, high, last.close
            ));
        }
        _ => out.push_str("No price history.\n"),
    }

    for warning in &overview.warnings {
        out.push_str(&format!("! {warning}\n"));
    }
    out
}

fn spike_message(report: &VolumeReport) -> String {
    match report.latest_spike {
        Some(spike) => format!("{}: {:.2}x average", report.level, spike),
        None => format!("{}: n/a (not enough history for an average)", report.level),
    }
}

fn volume_table(report: &VolumeReport) -> Table {
    let mut table = new_table(&["Date", "Volume", "Avg Volume", "Spike"]);
    for row in &report.rows {
        table.add_row(vec![
            row.date.to_string(),
            format_thousands(row.volume),
            row.avg_volume
                .map_or_else(|| "n/a".to_string(), |avg| format_thousands(avg.round() as u64)),
            row.spike
                .map_or_else(|| "n/a".to_string(), |spike| format!("{spike:.2}x")),
        ]);
    }
    table
}

fn volume_sparklines(report: &VolumeReport) -> String {
    let volumes: Vec<f64> = report.rows.iter().map(|r| r.volume as f64).collect();
    let averages: Vec<f64> = report
        .rows
        .iter()
        .map(|r| r.avg_volume.unwrap_or(f64::NAN))
        .collect();
    format!(
        "Volume      {}\nAvg Volume  {}\n",
        sparkline(&volumes),
        sparkline(&averages)
    )
}

pub fn render_volume(report: &Result<VolumeReport>) -> String {
    let mut out = heading("Volume Spike Analysis");
    match report {
        Ok(report) => {
            out.push_str(&volume_sparklines(report));
            out.push_str(&format!("{}\n", volume_table(report)));
            out.push_str("\nShort Squeeze Signal\n");
            out.push_str(&format!("{}\n", spike_message(report)));
        }
        Err(e) => out.push_str(&format!("Volume data unavailable: {e}\n")),
    }
    out
}

fn holder_table(fetch: &HolderFetch, absent: &str, failed: &str) -> String {
    match fetch {
        HolderFetch::Table(holders) if holders.is_empty() => "Table is empty.\n".to_string(),
        HolderFetch::Table(holders) => {
            let columns: Vec<&str> = holders.columns.iter().map(String::as_str).collect();
            let mut table = new_table(&columns);
            for row in &holders.rows {
                table.add_row(row.clone());
            }
            format!("{table}\n")
        }
        HolderFetch::Absent => format!("{absent}\n"),
        HolderFetch::Failed(message) => format!("{failed}: {message}\n"),
    }
}

pub fn render_holders(report: &HoldersReport) -> String {
    let mut out = heading("Major Institutional Holders");
    out.push_str(&holder_table(
        &report.institutional,
        "No institutional holder data found.",
        "Error loading holder data",
    ));
    out.push_str("\nMajor Holders (Summary)\n");
    out.push_str(&holder_table(
        &report.major,
        "Major holder data not available.",
        "Error loading major holder data",
    ));
    out
}

pub fn render_retail(mentions: &MentionCount) -> String {
    let mut out = heading("Reddit Mentions");
    match mentions {
        MentionCount::Count(count) => {
            out.push_str(&format!("Reddit mentions in recent posts: {count}\n"));
            out.push_str(&format!("{}\n", MentionLevel::classify(*count)));
            out.push_str("(Heading count on the search page; a layout change reads as zero.)\n");
        }
        MentionCount::Error(message) => out.push_str(&format!("{message}\n")),
    }
    out
}

pub fn render_squeeze(report: &Result<SqueezeReport>) -> String {
    let mut out = heading("Short Squeeze Detector");
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            out.push_str(&format!("Volume data unavailable: {e}\n"));
            return out;
        }
    };

    out.push_str(&volume_sparklines(&report.volume));
    out.push_str("\nVolume Spike Score\n");
    match report.volume.latest_spike {
        Some(spike) => out.push_str(&format!(
            "Latest volume is {spike:.2}x the average volume.\n"
        )),
        None => out.push_str("Latest volume spike is n/a (not enough history).\n"),
    }

    out.push_str("\nShort Interest Data\n");
    match &report.short_interest {
        Some(stats) => {
            let mut table = new_table(&["Short Interest % Float", "Days to Cover"]);
            table.add_row(vec![
                format_decimal(stats.short_percent_of_float, 2),
                format_decimal(stats.days_to_cover, 2),
            ]);
            out.push_str(&format!("{table}\n"));
        }
        None => out.push_str("Short interest data unavailable.\n"),
    }

    out.push_str(&format!(
        "\nSqueeze Potential Rating (Unofficial): {}\n",
        report.rating
    ));
    out
}

pub fn render_news(items: &[HeadlineItem]) -> String {
    let mut out = heading("Latest News Headlines");
    if items.is_empty() {
        out.push_str("No news found.\n");
    }
    for item in items {
        out.push_str(&format!("- {}\n  {}\n", item.title, item.link));
    }
    out
}

fn contract_table<'a>(rows: impl Iterator<Item = &'a CategorizedContract>) -> Table {
    let mut table = new_table(&[
        "Contract", "Side", "Strike", "Last", "Bid", "Ask", "Mid", "Open Int", "OI %Chg",
        "Volume", "Vol %Chg", "IV", "Category",
    ]);
    for row in rows {
        let c = &row.contract;
        table.add_row(vec![
            Cell::new(&c.contract_symbol),
            Cell::new(row.side),
            Cell::new(format!("{:.2}", c.strike)),
            Cell::new(format_decimal(c.last_price, 2)),
            Cell::new(format_decimal(c.bid, 2)),
            Cell::new(format_decimal(c.ask, 2)),
            Cell::new(format_decimal(row.mid_price, 3)),
            Cell::new(c.open_interest.map_or_else(|| "N/A".to_string(), format_thousands)),
            Cell::new(format_percent(row.oi_pct_change)),
            Cell::new(c.volume.map_or_else(|| "N/A".to_string(), format_thousands)),
            Cell::new(format_percent(row.volume_pct_change)),
            Cell::new(format_decimal(c.implied_volatility.map(|iv| iv * 100.0), 1)),
            Cell::new(row.category).fg(category_color(row.category)),
        ]);
    }
    table
}

fn open_interest_chart(rows: &[CategorizedContract]) -> Table {
    let max = rows
        .iter()
        .filter_map(|r| r.contract.open_interest)
        .max()
        .unwrap_or(0);

    let mut table = new_table(&["Side", "Strike", "Category", "Open Interest", ""]);
    for row in rows {
        let open_interest = row.contract.open_interest.unwrap_or(0);
        let color = category_color(row.category);
        table.add_row(vec![
            Cell::new(row.side),
            Cell::new(format!("{:.2}", row.contract.strike)),
            Cell::new(row.category).fg(color),
            Cell::new(format_thousands(open_interest)),
            Cell::new(bar(open_interest, max, BAR_WIDTH)).fg(color),
        ]);
    }
    table
}

pub fn render_options(panel: &OptionsPanel, side: SideFilter) -> String {
    let mut out = heading("Option Interest");

    let view = match panel {
        OptionsPanel::NoExpirations => {
            out.push_str("Could not fetch expiration dates.\n");
            return out;
        }
        OptionsPanel::NoData {
            expirations,
            expiration,
        } => {
            out.push_str(&expiration_line(expirations, expiration));
            out.push_str("No options data available for this expiry.\n");
            return out;
        }
        OptionsPanel::Ready(view) => view,
    };

    let analysis = &view.analysis;
    out.push_str(&expiration_line(&view.expirations, &view.expiration));
    out.push_str(&format!(
        "Current price: {:.2}   Option type: {}\n\n",
        analysis.current_price, side
    ));

    for option_side in [OptionSide::Call, OptionSide::Put] {
        if side.shows(option_side) {
            out.push_str(&format!("{option_side}s\n"));
            out.push_str(&format!("{}\n\n", contract_table(analysis.side(option_side))));
        }
    }

    out.push_str(&format!(
        "Open Interest by Category for {}\n",
        analysis.expiration
    ));
    out.push_str(&format!("{}\n", open_interest_chart(&analysis.contracts)));
    out.push_str(&format!("{}\n", analysis.annotation()));
    out.push_str(&format!(
        "Total call OI: {}   Total put OI: {}\n",
        format_thousands(analysis.total_call_oi),
        format_thousands(analysis.total_put_oi)
    ));
    out
}

fn expiration_line(expirations: &[String], selected: &str) -> String {
    let listed: Vec<String> = expirations
        .iter()
        .map(|e| {
            if e == selected {
                format!("[{e}]")
            } else {
                e.clone()
            }
        })
        .collect();
    format!("Expirations: {}\n", listed.join(" "))
}

pub fn render_earnings(date: &EarningsDate) -> String {
    let mut out = heading("Earnings Information");
    out.push_str(&format!("Next Earnings Date: {date}\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_market::analytics::analyze_chains;
    use dash_market::{Chain, HolderTable, OptionContract, OptionsView, PriceBar, QuoteInfo};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn contract(symbol: &str, strike: f64, open_interest: u64) -> OptionContract {
        OptionContract {
            contract_symbol: symbol.to_string(),
            strike,
            bid: Some(1.0),
            ask: Some(1.5),
            open_interest: Some(open_interest),
            volume: Some(10),
            ..Default::default()
        }
    }

    fn ready_panel() -> OptionsPanel {
        let calls = Chain {
            expiration: "2024-05-17".to_string(),
            side: OptionSide::Call,
            contracts: vec![
                contract("GME240517C00095000", 95.0, 100),
                contract("GME240517C00100000", 100.0, 200),
            ],
        };
        let puts = Chain {
            expiration: "2024-05-17".to_string(),
            side: OptionSide::Put,
            contracts: vec![contract("GME240517P00105000", 105.0, 150)],
        };
        let analysis = analyze_chains(Some(&calls), Some(&puts), 100.0, 0.02).unwrap();
        OptionsPanel::Ready(Box::new(OptionsView {
            expirations: vec!["2024-05-17".to_string(), "2024-05-24".to_string()],
            expiration: "2024-05-17".to_string(),
            analysis,
        }))
    }

    #[test]
    fn test_sparkline() {
        assert_eq!(sparkline(&[1.0, 2.0, 3.0]), "▁▅█");
        assert_eq!(sparkline(&[5.0, 5.0]), "▄▄");
        assert_eq!(sparkline(&[f64::NAN, 1.0, 2.0]), " ▁█");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0, 100, 10), "");
        assert_eq!(bar(100, 0, 10), "");
        assert_eq!(bar(100, 100, 10).chars().count(), 10);
        assert_eq!(bar(50, 100, 10).chars().count(), 5);
        assert_eq!(bar(1, 1_000, 10).chars().count(), 1);
    }

    #[test]
    fn test_category_colors() {
        assert_eq!(category_color(Moneyness::Itm), Color::Green);
        assert_eq!(category_color(Moneyness::Otm), Color::Grey);
        assert_ne!(category_color(Moneyness::Atm), category_color(Moneyness::Itm));
    }

    #[test]
    fn test_render_overview_fallbacks() {
        let overview = Overview {
            name: "GME".to_string(),
            quote: QuoteInfo {
                price: Some(23.14),
                market_cap: Some(7_069_000_000),
                ..Default::default()
            },
            history: vec![
                PriceBar {
                    date: date(1),
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 10.0,
                    volume: 1,
                },
                PriceBar {
                    date: date(2),
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 12.0,
                    volume: 1,
                },
            ],
            warnings: vec![],
        };
        let text = render_overview(&Ticker::parse("GME").unwrap(), &overview);
        assert!(text.contains("GME (GME)"));
        assert!(text.contains("23.14"));
        assert!(text.contains("7,069,000,000"));
        assert!(text.contains("N/A"));
        assert!(text.contains("2024-04-01 .. 2024-04-02"));
    }

    #[test]
    fn test_render_options_states() {
        assert!(render_options(&OptionsPanel::NoExpirations, SideFilter::Both)
            .contains("Could not fetch expiration dates."));

        let no_data = OptionsPanel::NoData {
            expirations: vec!["2024-05-17".to_string()],
            expiration: "2024-05-17".to_string(),
        };
        let text = render_options(&no_data, SideFilter::Both);
        assert!(text.contains("No options data available for this expiry."));
        assert!(!text.contains("Put/Call Open Interest Ratio"));
    }

    #[test]
    fn test_render_options_ready() {
        let text = render_options(&ready_panel(), SideFilter::Calls);
        assert!(text.contains("[2024-05-17] 2024-05-24"));
        assert!(text.contains("GME240517C00095000"));
        // the raw table is filtered, the chart always has both sides
        assert!(!text.contains("GME240517P00105000"));
        assert!(text.contains("Open Interest by Category for 2024-05-17"));
        assert!(text.contains("Put/Call Open Interest Ratio: 0.50"));

        let text = render_options(&ready_panel(), SideFilter::Both);
        assert!(text.contains("GME240517P00105000"));
    }

    #[test]
    fn test_render_holders() {
        let report = HoldersReport {
            institutional: HolderFetch::Table(HolderTable {
                columns: vec!["Holder".to_string(), "Shares".to_string()],
                rows: vec![vec!["Vanguard Group Inc".to_string(), "27,000,000".to_string()]],
            }),
            major: HolderFetch::Absent,
        };
        let text = render_holders(&report);
        assert!(text.contains("Vanguard Group Inc"));
        assert!(text.contains("Major holder data not available."));

        let report = HoldersReport {
            institutional: HolderFetch::Failed("timeout".to_string()),
            major: HolderFetch::Table(HolderTable::default()),
        };
        let text = render_holders(&report);
        assert!(text.contains("Error loading holder data: timeout"));
        assert!(text.contains("Table is empty."));
    }

    #[test]
    fn test_render_retail_and_news() {
        let text = render_retail(&MentionCount::Count(12));
        assert!(text.contains("Reddit mentions in recent posts: 12"));
        assert!(text.contains("Strong Reddit chatter!"));

        let text = render_retail(&MentionCount::Error("Error: HTTP 429".to_string()));
        assert!(text.contains("Error: HTTP 429"));

        assert!(render_news(&[]).contains("No news found."));
    }

    #[test]
    fn test_render_earnings() {
        assert!(render_earnings(&EarningsDate::NotAvailable)
            .contains("Next Earnings Date: Earnings Date not available"));
    }
}

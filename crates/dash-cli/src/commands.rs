//! Command parsing for the interactive dashboard
//!
//! Plain input selects a ticker; `/`-prefixed input changes what is shown.

use anyhow::{Result, anyhow, bail};
use dash_market::{OptionSide, Ticker};
use std::fmt;
use std::str::FromStr;

/// A single dashboard panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Overview,
    Volume,
    Holders,
    Retail,
    Squeeze,
    News,
    Options,
    Earnings,
}

impl PanelKind {
    /// Every panel, in dashboard order
    pub const ALL: [PanelKind; 8] = [
        Self::Overview,
        Self::Volume,
        Self::Holders,
        Self::Retail,
        Self::Squeeze,
        Self::News,
        Self::Options,
        Self::Earnings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Volume => "Volume Spike",
            Self::Holders => "Holders",
            Self::Retail => "Retail Interest",
            Self::Squeeze => "Short Squeeze",
            Self::News => "News",
            Self::Options => "Option Interest",
            Self::Earnings => "Earnings",
        }
    }
}

impl FromStr for PanelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overview" | "o" => Ok(Self::Overview),
            "volume" | "v" => Ok(Self::Volume),
            "holders" => Ok(Self::Holders),
            "retail" | "reddit" | "r" => Ok(Self::Retail),
            "squeeze" | "s" => Ok(Self::Squeeze),
            "news" | "n" => Ok(Self::News),
            "options" | "opt" => Ok(Self::Options),
            "earnings" | "e" => Ok(Self::Earnings),
            other => Err(format!(
                "unknown panel: {other} (expected all, overview, volume, holders, retail, squeeze, news, options or earnings)"
            )),
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// What to render: every panel or just one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelSelection {
    #[default]
    All,
    Only(PanelKind),
}

impl PanelSelection {
    /// Panels to render, in dashboard order
    pub fn panels(&self) -> &[PanelKind] {
        match self {
            Self::All => &PanelKind::ALL,
            Self::Only(kind) => std::slice::from_ref(kind),
        }
    }

    pub fn includes(&self, kind: PanelKind) -> bool {
        self.panels().contains(&kind)
    }
}

impl FromStr for PanelSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

impl fmt::Display for PanelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All Panels"),
            Self::Only(kind) => f.write_str(kind.title()),
        }
    }
}

/// Which chain the raw options table shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideFilter {
    Calls,
    Puts,
    #[default]
    Both,
}

impl SideFilter {
    pub fn shows(self, side: OptionSide) -> bool {
        matches!(
            (self, side),
            (Self::Both, _) | (Self::Calls, OptionSide::Call) | (Self::Puts, OptionSide::Put)
        )
    }
}

impl FromStr for SideFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calls" | "call" | "c" => Ok(Self::Calls),
            "puts" | "put" | "p" => Ok(Self::Puts),
            "both" | "all" | "b" => Ok(Self::Both),
            other => Err(format!("unknown side: {other} (expected calls, puts or both)")),
        }
    }
}

impl fmt::Display for SideFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calls => f.write_str("Calls"),
            Self::Puts => f.write_str("Puts"),
            Self::Both => f.write_str("Both"),
        }
    }
}

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Switch to a ticker and redraw
    Ticker(Ticker),
    /// Show one panel or all of them
    Panel(PanelSelection),
    /// Select an options expiration
    Expiry(String),
    /// Select the raw options table side
    Side(SideFilter),
    /// Redraw with the current selection
    Refresh,
    Help,
    Exit,
}

impl Command {
    /// Parse a command from user input
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.is_empty() {
            bail!("Empty input");
        }

        let Some(command) = input.strip_prefix('/') else {
            return Ok(Command::Ticker(Ticker::parse(input)?));
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some(first) = parts.first() else {
            bail!("Empty command");
        };

        let cmd = first.to_lowercase();
        let arg = parts.get(1).copied();

        match cmd.as_str() {
            "ticker" | "t" => {
                let symbol = arg.ok_or_else(|| anyhow!("Missing symbol for ticker command"))?;
                Ok(Command::Ticker(Ticker::parse(symbol)?))
            }
            "panel" | "p" => {
                let name = arg.ok_or_else(|| anyhow!("Missing name for panel command"))?;
                Ok(Command::Panel(name.parse().map_err(|e: String| anyhow!(e))?))
            }
            "expiry" | "exp" => {
                let date = arg.ok_or_else(|| anyhow!("Missing date for expiry command"))?;
                Ok(Command::Expiry(date.to_string()))
            }
            "side" => {
                let side = arg.ok_or_else(|| anyhow!("Missing side for side command"))?;
                Ok(Command::Side(side.parse().map_err(|e: String| anyhow!(e))?))
            }
            "refresh" | "r" => Ok(Command::Refresh),
            "help" | "h" | "?" => Ok(Command::Help),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            _ => bail!("Unknown command: {}", cmd),
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r"
Stock Research Dashboard Commands
=================================

  <ticker>               Switch ticker (e.g. GME, TSLA)
  /ticker <symbol>       Switch ticker
  /panel <name>          Show one panel: overview, volume, holders, retail,
                         squeeze, news, options, earnings, or all
  /expiry <YYYY-MM-DD>   Select the options expiration
  /side <calls|puts|both> Select the raw options table
  /refresh               Fetch and redraw the current selection
  /help                  Show help
  /exit                  Exit

Command Aliases:
  /t = /ticker     /p = /panel     /exp = /expiry
  /r = /refresh    /h = /help      /q = /exit
"
    }
}

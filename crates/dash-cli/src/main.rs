//! Stock Research Dashboard CLI
//!
//! Renders the dashboard panels for one ticker, once or interactively.
//!
//! # Usage
//!
//! ```bash
//! # Every panel for the default ticker
//! cargo run --bin tickerdash
//!
//! # Only the options panel, puts table, for a given expiry
//! cargo run --bin tickerdash -- TSLA --panel options --side puts --expiry 2024-05-17
//!
//! # Interactive session
//! cargo run --bin tickerdash -- --interactive
//! ```

mod commands;
mod render;

use clap::Parser;
use commands::{Command, PanelKind, PanelSelection, SideFilter};
use dash_market::{DashConfig, Dashboard, Ticker};
use dash_utils::{LogFormat, init_tracing};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str = "warn,dash_market=info,tickerdash=info";

#[derive(Parser, Debug)]
#[command(name = "tickerdash")]
#[command(about = "Stock research dashboard in the terminal", long_about = None)]
struct Args {
    /// Stock ticker, e.g. GME or TSLA
    #[arg(default_value = "GME")]
    ticker: String,

    /// Panel to show: overview, volume, holders, retail, squeeze, news, options, earnings or all
    #[arg(short, long, default_value = "all")]
    panel: PanelSelection,

    /// Options expiration (YYYY-MM-DD), the nearest one when omitted or not listed
    #[arg(short, long)]
    expiry: Option<String>,

    /// Raw options table to show: calls, puts or both
    #[arg(short, long, default_value = "both")]
    side: SideFilter,

    /// Keep reading commands after the first render
    #[arg(short, long)]
    interactive: bool,

    /// Log output format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

/// Current selection of an interactive session
#[derive(Debug, Clone)]
struct Session {
    ticker: Ticker,
    panel: PanelSelection,
    expiry: Option<String>,
    side: SideFilter,
}

impl Session {
    fn prompt(&self) -> String {
        format!("{} [{}]> ", self.ticker, self.panel)
    }
}

async fn render_panel(dashboard: &Dashboard, session: &Session, panel: PanelKind) -> String {
    let ticker = &session.ticker;
    match panel {
        PanelKind::Overview => render::render_overview(ticker, &dashboard.overview(ticker).await),
        PanelKind::Volume => render::render_volume(&dashboard.volume(ticker).await),
        PanelKind::Holders => render::render_holders(&dashboard.holders(ticker).await),
        PanelKind::Retail => render::render_retail(&dashboard.fetch_mentions(ticker).await),
        PanelKind::Squeeze => render::render_squeeze(&dashboard.squeeze(ticker).await),
        PanelKind::News => render::render_news(&dashboard.fetch_headlines(ticker).await),
        PanelKind::Options => render::render_options(
            &dashboard.options(ticker, session.expiry.as_deref()).await,
            session.side,
        ),
        PanelKind::Earnings => render::render_earnings(&dashboard.earnings_date(ticker).await),
    }
}

async fn draw(dashboard: &Dashboard, session: &Session) {
    info!("Rendering {} for {}", session.panel, session.ticker);
    for &panel in session.panel.panels() {
        println!("{}", render_panel(dashboard, session, panel).await);
    }
}

fn print_banner() {
    println!(
        r"
╔══════════════════════════════════════════════════════════════╗
║                  Stock Research Dashboard                    ║
║                                                              ║
║  Type a ticker (e.g. GME, TSLA) to load its dashboard.       ║
║    /panel <name>   - Show one panel (or all)                 ║
║    /expiry <date>  - Select the options expiration           ║
║    /side <side>    - calls, puts or both                     ║
║    /help           - Help                                    ║
║    /exit           - Exit                                    ║
╚══════════════════════════════════════════════════════════════╝
"
    );
}

async fn run_interactive(dashboard: &Dashboard, mut session: Session) -> anyhow::Result<()> {
    print_banner();
    draw(dashboard, &session).await;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", session.prompt());
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        if input.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&input) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("Error: {e}\n");
                continue;
            }
        };

        match command {
            Command::Ticker(ticker) => {
                session.ticker = ticker;
                session.expiry = None;
            }
            Command::Panel(panel) => session.panel = panel,
            Command::Expiry(expiry) => session.expiry = Some(expiry),
            Command::Side(side) => session.side = side,
            Command::Refresh => {}
            Command::Help => {
                println!("{}", Command::help_text());
                continue;
            }
            Command::Exit => {
                println!("Goodbye!");
                break;
            }
        }

        draw(dashboard, &session).await;
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(DEFAULT_LOG_FILTER, args.log_format);

    let ticker = Ticker::parse(&args.ticker)?;
    let config = Arc::new(DashConfig::default().with_env_overrides()?);
    info!("Starting tickerdash for {}", ticker);

    let dashboard = Dashboard::with_default_sources(config)?;

    let session = Session {
        ticker,
        panel: args.panel,
        expiry: args.expiry,
        side: args.side,
    };

    if args.interactive {
        run_interactive(&dashboard, session).await
    } else {
        if session.expiry.is_some() && !session.panel.includes(PanelKind::Options) {
            warn!("--expiry only affects the options panel");
        }
        draw(&dashboard, &session).await;
        Ok(())
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_core::Verbosity;
use tally_store::ExpensePatch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod dispatcher;
mod input;
mod render;
mod state;
mod telegram;
mod transport;

use commands::ChartKind;
use config::{Config, Environment};

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")"),
    about = "Personal expense tracker: Telegram bot and CLI"
)]
struct Cli {
    /// Debug logging and full detail for rejected records
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the Telegram bot until Ctrl+C
    Bot,

    /// Record one expense
    Add {
        category: String,

        #[arg(allow_negative_numbers = true)]
        amount: f64,

        /// Free-text note (may contain spaces)
        note: Vec<String>,
    },

    /// Show the most recent expenses with their total
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Change fields of a stored expense
    Update {
        id: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f64>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Total spent in one calendar month
    Month { year: i32, month: u32 },

    /// Total, average, extremes, count and top category
    Stats,

    /// Render a chart to an SVG file
    Chart {
        #[arg(value_enum)]
        kind: ChartKind,

        #[arg(long)]
        out: PathBuf,
    },

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config (never overwrites)
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    if let Command::Config { command } = &cli.command {
        match command {
            ConfigCommand::Init => {
                config::init_config()?;
            }
        }
        return Ok(());
    }

    config::load_dotenv();
    let env = Environment::from_process()?;
    let cfg = config::load_config()?;
    let verbosity = Verbosity::from_debug_flag(cli.verbose || env.debug);
    let symbol = cfg.report.currency_symbol.as_str();

    if let Command::Bot = cli.command {
        return commands::run_bot(&env, &cfg, verbosity).await;
    }

    let store = commands::open_store(&env, &cfg)?;
    match cli.command {
        Command::Add {
            category,
            amount,
            note,
        } => {
            commands::add(&store, &category, amount, &note.join(" "), symbol).await?;
        }

        Command::List { limit } => {
            commands::list(&store, limit, symbol, verbosity).await?;
        }

        Command::Update {
            id,
            category,
            amount,
            note,
        } => {
            let patch = ExpensePatch {
                category,
                amount,
                note,
            };
            commands::update(&store, &id, patch).await?;
        }

        Command::Month { year, month } => {
            commands::month(&store, year, month, symbol).await?;
        }

        Command::Stats => {
            commands::stats(&store, symbol, verbosity).await?;
        }

        Command::Chart { kind, out } => {
            commands::chart(&store, kind, &out, &cfg, verbosity).await?;
        }

        Command::Bot | Command::Config { .. } => {}
    }

    Ok(())
}

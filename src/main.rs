use anyhow::Result;
use clap::{Parser, Subcommand};

use imsdash::cli;

#[derive(Debug, Parser)]
#[command(name = "imsdash")]
#[command(about = "Live inventory dashboard and assistant chat for the IMS backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seed the dashboard from history, then poll for new snapshots
    Watch {
        /// Stop after this many polls (default: run until interrupted)
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Fetch the history once and print every series
    Snapshot {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Ask the IMS assistant; starts an interactive session without MESSAGE
    Chat {
        /// Message to send
        message: Option<String>,
    },
    /// Check that the backend endpoints respond
    Health,
    /// Show recent entries from the event log
    Events {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        last: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage ~/.imsdash/config.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the annotated default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one dotted key, e.g. `dashboard.capacity 30`
    Set { key: String, value: String },
    /// Restore the default config file
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Watch { ticks } => cli::run_watch(ticks),
        Commands::Snapshot { format } => {
            cli::run_snapshot(cli::OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Chat { message } => cli::run_chat(message),
        Commands::Health => cli::run_health(),
        Commands::Events { last, format } => {
            cli::run_events(last, cli::OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

//! Consumable header-bidding CLI.
//!
//! This tool provides commands for:
//! - Validating adapter configuration files
//! - Printing the outbound bid request for an xSlot
//! - Applying a recorded bid response to an xSlot
//! - Running a live test auction against the endpoint

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

mod auction;
mod config;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "chtb")]
#[command(about = "Consumable header-bidding adapter CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the outbound request for an xSlot
    Request {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,

        /// Name of the configured xSlot
        #[arg(long)]
        slot: String,
    },

    /// Apply a bid response to an xSlot and print the outcome
    Parse {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,

        /// Name of the configured xSlot
        #[arg(long)]
        slot: String,

        /// Bid response as inline JSON or a path to a JSON file
        #[arg(long, short)]
        response: String,

        /// Session id reported with analytics events
        #[arg(long)]
        session: Option<String>,

        /// Render the winning creative (fires its win notice)
        #[arg(long)]
        render: bool,
    },

    /// Request a bid from the endpoint and print the outcome
    Bid {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,

        /// Name of the configured xSlot
        #[arg(long)]
        slot: String,

        /// Session id reported with analytics events
        #[arg(long)]
        session: Option<String>,

        /// Render the winning creative (fires its win notice)
        #[arg(long)]
        render: bool,

        /// Request timeout in milliseconds
        #[arg(long, default_value_t = 1000, env = "CONSUMABLE_TIMEOUT_MS")]
        timeout_ms: u64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate config against settings validation
    Validate {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = consumable_htb_common::logging::init_logging(level) {
        eprintln!("Failed to initialize logging: {:?}", e);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Validate { file } => config::validate(file, cli.verbose),
        },
        Commands::Request { file, slot } => auction::request(file, slot, cli.verbose),
        Commands::Parse {
            file,
            slot,
            response,
            session,
            render,
        } => auction::parse(file, slot, response, session, render, cli.verbose),
        Commands::Bid {
            file,
            slot,
            session,
            render,
            timeout_ms,
        } => auction::bid(file, slot, session, render, timeout_ms, cli.verbose),
    }
}

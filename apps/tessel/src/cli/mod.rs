//! # Tessel CLI Module
//!
//! This module implements the CLI interface for Tessel.
//!
//! ## Available Commands
//!
//! - `init` - Initialize a sale from a TOML config file
//! - `server` - Start the HTTP server
//! - `status` - Show sale status
//! - `stage` - Refresh and show the current stage
//! - `rate` - Show the current rate
//! - `buy` - Purchase tokens
//! - `sweep` - Sweep unsold supply to the future reserve (owner)
//! - `withdraw` - Withdraw residual funds (owner)

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tessel_core::SaleError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tessel - Token Sale Engine
///
/// A deterministic, time-phased token sale: contributions convert to tokens
/// at stage-dependent rates, bounded by a hard cap, with owner-restricted
/// post-sale settlement.
#[derive(Parser, Debug)]
#[command(name = "tessel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the sale database
    #[arg(short = 'D', long, global = true, default_value = "tessel.db")]
    pub database: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a sale from a TOML config file
    Init {
        /// Path to the sale configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Force initialization even if the database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show sale status
    Status,

    /// Refresh and show the current stage
    Stage,

    /// Show the current rate
    Rate,

    /// Purchase tokens
    Buy {
        /// Beneficiary account id
        #[arg(short, long)]
        beneficiary: u64,

        /// Contribution in whole ether
        #[arg(short, long, conflicts_with = "wei")]
        ether: Option<u64>,

        /// Contribution in raw wei
        #[arg(short, long)]
        wei: Option<u128>,
    },

    /// Sweep unsold supply to the future reserve (owner)
    Sweep {
        /// Calling account id; must be the sale owner
        #[arg(short, long)]
        caller: u64,
    },

    /// Withdraw residual funds to the owner (owner)
    Withdraw {
        /// Calling account id; must be the sale owner
        #[arg(short, long)]
        caller: u64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SaleError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { config, force }) => cmd_init(&cli.database, &config, force),
        Some(Commands::Server { host, port }) => cmd_server(&cli.database, &host, port).await,
        Some(Commands::Status) => cmd_status(&cli.database, json_mode),
        Some(Commands::Stage) => cmd_stage(&cli.database, json_mode),
        Some(Commands::Rate) => cmd_rate(&cli.database, json_mode),
        Some(Commands::Buy {
            beneficiary,
            ether,
            wei,
        }) => cmd_buy(&cli.database, json_mode, beneficiary, ether, wei),
        Some(Commands::Sweep { caller }) => cmd_sweep(&cli.database, json_mode, caller),
        Some(Commands::Withdraw { caller }) => cmd_withdraw(&cli.database, json_mode, caller),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, json_mode)
        }
    }
}

//! # Tessel - Token Sale Engine
//!
//! The main binary for the Tessel time-phased token sale engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for sale operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                apps/tessel (THE BINARY)          │
//! │                                                  │
//! │   ┌─────────────┐         ┌─────────────┐       │
//! │   │   CLI       │         │   HTTP API  │       │
//! │   │  (clap)     │         │   (axum)    │       │
//! │   └──────┬──────┘         └──────┬──────┘       │
//! │          │                       │              │
//! │          └───────────┬───────────┘              │
//! │                      ▼                          │
//! │              ┌───────────────┐                  │
//! │              │  tessel-core  │                  │
//! │              │  (THE LOGIC)  │                  │
//! │              └───────────────┘                  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Initialize a sale from a TOML config
//! tessel init -c sale.toml
//!
//! # Start the HTTP server
//! tessel server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! tessel status
//! tessel buy --beneficiary 100 --ether 1
//! ```

use clap::Parser;
use tessel::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — TESSEL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TESSEL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tessel=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Tessel startup banner.
fn print_banner() {
    println!(
        r#"
  ████████╗███████╗███████╗███████╗███████╗██╗
  ╚══██╔══╝██╔════╝██╔════╝██╔════╝██╔════╝██║
     ██║   █████╗  ███████╗███████╗█████╗  ██║
     ██║   ██╔══╝  ╚════██║╚════██║██╔══╝  ██║
     ██║   ███████╗███████║███████║███████╗███████╗
     ╚═╝   ╚══════╝╚══════╝╚══════╝╚══════╝╚══════╝

  Token Sale Engine v{}

  Deterministic • Atomic • Auditable
"#,
        env!("CARGO_PKG_VERSION")
    );
}

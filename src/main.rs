//! sandftp - Entry Point
//!
//! A sandboxed, read-only FTP server: per-user roots, active and passive data
//! connections, LIST and RETR.

use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info};
use std::process::ExitCode;

use sandftp::{Server, ServerConfig};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "sandftp", about = "A sandboxed read-only FTP server.")]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Control port, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose mode
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    // RUST_LOG still takes precedence over the default filter
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let mut config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(port) = args.port {
        config.control_port = port;
    }

    info!("Launching FTP server...");

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match server.run().await {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

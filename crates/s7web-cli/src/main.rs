//! s7web CLI - Command-line interface for the device Web API
//!
//! Provides commands for:
//! - Verifying credentials against a device
//! - Deploying a local directory to a web application
//! - Downloading individual resources
//! - Inspecting and closing session tickets
//! - Showing a web application's deployment status

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    deploy::DeployCommand,
    download::DownloadCommand,
    login::LoginCommand,
    status::StatusCommand,
    tickets::TicketsCommand,
};
use output::{Console, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "s7web", version, about = "Client for the S7 device Web API")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Verify credentials against the device
    Login(LoginCommand),
    /// Deploy a local directory to a web application
    Deploy(DeployCommand),
    /// Download a single resource from a web application
    Download(DownloadCommand),
    /// Inspect and close session tickets
    #[command(subcommand)]
    Tickets(TicketsCommand),
    /// Show a web application's deployment status
    Status(StatusCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let console = Console::new(format);
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Login(cmd) => cmd.execute(console, config_path).await,
        Commands::Deploy(cmd) => cmd.execute(console, config_path).await,
        Commands::Download(cmd) => cmd.execute(console, config_path).await,
        Commands::Tickets(cmd) => cmd.execute(console, config_path).await,
        Commands::Status(cmd) => cmd.execute(console, config_path).await,
    };

    if let Err(err) = result {
        console.failure(&format!("{err:#}"));
        std::process::exit(1);
    }
}

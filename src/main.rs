mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod server;
mod services;
mod workflow;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::incidents::{self as incidents_cmd, IncidentsArgs};
use crate::cmd::serve;
use crate::config::AppConfig;
use crate::error::AppResult;

#[derive(Parser)]
#[command(
    name = "snowdesk",
    author,
    version,
    about = "ServiceNow incident proxy for Backstage"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        long,
        global = true,
        env = "SNOWDESK_CONFIG",
        default_value = "snowdesk.toml"
    )]
    config: PathBuf,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP proxy.
    Serve,
    /// Query incidents directly from ServiceNow.
    Incidents(IncidentsArgs),
    /// Inspect and validate configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command, &cli.config),
        Commands::Serve => serve::run(AppConfig::load(&cli.config)?).await,
        Commands::Incidents(args) => incidents_cmd::run(AppConfig::load(&cli.config)?, args).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

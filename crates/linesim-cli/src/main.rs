//! linesim - replay scripted LINE chat scenarios in the terminal.
//!
//! Loads configuration, fetches the scenario catalog and hands stdin to the
//! interactive console.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use linesim_cli::bootstrap::{self, Overrides};
use linesim_cli::{Console, render};
use linesim_config::Config;
use tokio::io::BufReader;

/// linesim - LINE chat scenario simulator
#[derive(Parser)]
#[command(name = "linesim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra config file, merged over the user config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog endpoint for the selected environment
    #[arg(long)]
    catalog_url: Option<String>,

    /// Read scenarios from a local JSON file instead of the endpoint
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    /// Catalog environment: production or development
    #[arg(long = "env")]
    environment: Option<String>,

    /// Log filter (e.g. "debug" or "warn,linesim=debug")
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: pretty, compact, json or full
    #[arg(long)]
    log_format: Option<String>,

    /// Do not load the catalog at startup
    #[arg(long)]
    no_refresh: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            catalog_url: self.catalog_url.clone(),
            catalog_file: self.catalog_file.clone(),
            environment: self.environment.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())
        .context("failed to load configuration")?
        .config;
    bootstrap::apply_overrides(&mut config, &cli.overrides())?;

    linesim_telemetry::setup_logging(&bootstrap::log_config(&config)?)?;

    let simulator = bootstrap::build_simulator(&config)?;
    let console = Console::stdout(simulator.clone());

    println!("{}", render::banner());
    if !cli.no_refresh
        && let Some(report) = simulator.refresh_catalog().await
    {
        println!("{}", render::refresh_report(&report));
    }
    println!("Type 'help' for commands.");

    console.run(BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

pub mod commands;
pub mod inventory_file;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use printdesk_core::config::{AppConfig, LogFormat, LoadOptions};
use tracing::Level;

use commands::consumption::ConsumptionArgs;
use commands::quote::QuoteArgs;
use commands::stock::StockArgs;

#[derive(Debug, Parser)]
#[command(
    name = "printdesk",
    about = "Print shop quoting and stock CLI",
    long_about = "Price 3D print jobs and check consumable stock against reorder points.",
    after_help = "Examples:
  printdesk quote --material PETG --weight 120 --hours 4.5 --quality fine --quantity 10
  printdesk quote --material PLA --dimensions 80x60x40 --use outdoor
  printdesk stock --inventory data/sample_inventory.toml --critical-only
  printdesk consumption --inventory data/sample_inventory.toml --category filament
  printdesk config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a printdesk.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a print job, or flag it for custom pricing")]
    Quote(QuoteArgs),
    #[command(about = "Evaluate an inventory snapshot against reorder points")]
    Stock(StockArgs),
    #[command(about = "Project consumable usage over a number of days")]
    Consumption(ConsumptionArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.config.clone())?;

    let result = match &cli.command {
        Command::Quote(args) => commands::quote::run(cli.config.clone(), args),
        Command::Stock(args) => commands::stock::run(cli.config.clone(), args),
        Command::Consumption(args) => commands::consumption::run(args),
        Command::Config => commands::config::run(cli.config.clone()),
    };

    println!("{}", result.output);
    Ok(ExitCode::from(result.exit_code))
}

/// Logs go to stderr so command output on stdout stays parseable.
fn init_logging(config_path: Option<PathBuf>) -> Result<()> {
    let require_file = config_path.is_some();
    let options = LoadOptions { config_path, require_file, ..LoadOptions::default() };
    let (level, format) = match AppConfig::load(options) {
        Ok(config) => {
            let level = config.logging.level.parse::<Level>().unwrap_or(Level::WARN);
            (level, config.logging.format)
        }
        // Config errors are reported by the command itself.
        Err(_) => (Level::WARN, LogFormat::Compact),
    };

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|error| anyhow!("failed to initialise logging: {error}"))
}

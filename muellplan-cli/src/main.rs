//! Command line tool that digitizes scanned waste collection calendars and
//! answers next-pickup queries for a collection zone.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use muellplan_core::ZoneCode;
use muellplan_core::config::{DEFAULT_CONFIG_PATH, PipelineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "muellplan", version)]
#[command(about = "Digitize waste collection calendars and query pickup dates")]
struct Cli {
    /// Pipeline configuration file.
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Overrides the configured calendar year.
    #[arg(long, global = true)]
    year: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read the configured calendar pages into raw CSV tables.
    Extract {
        /// Digitize cells one after another instead of on all cores.
        #[arg(long)]
        sequential: bool,
    },
    /// Compile the raw tables of the year into the zone schedule dataset.
    Compile,
    /// Print the next pickup date of every waste type for a zone.
    Next {
        /// Zone code such as `A1`.
        zone: ZoneCode,
        /// Reference date instead of today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Dataset files to query instead of the configured year.
        #[arg(long = "dataset")]
        datasets: Vec<PathBuf>,
    },
    /// Print every remaining collection day for a zone.
    Schedule {
        /// Zone code such as `A1`.
        zone: ZoneCode,
        /// Reference date instead of today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Dataset files to query instead of the configured year.
        #[arg(long = "dataset")]
        datasets: Vec<PathBuf>,
    },
    /// List the zones present in the dataset.
    Zones {
        /// Dataset files to query instead of the configured year.
        #[arg(long = "dataset")]
        datasets: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("muellplan=info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = PipelineConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    if let Some(year) = cli.year {
        config.year = year;
    }

    match cli.command {
        Command::Extract { sequential } => {
            if sequential {
                config.parallel = false;
            }
            commands::extract(&config)
        }
        Command::Compile => commands::compile(&config),
        Command::Next {
            zone,
            date,
            datasets,
        } => commands::next(&config, zone, date, datasets),
        Command::Schedule {
            zone,
            date,
            datasets,
        } => commands::schedule(&config, zone, date, datasets),
        Command::Zones { datasets } => commands::zones(&config, datasets),
    }
}

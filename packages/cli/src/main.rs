#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the urban heatwave forecaster.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use heatwave_cli::commands;
use heatwave_detect::DEFAULT_MIN_RUN;
use heatwave_tabular::DataLayout;

#[derive(Parser)]
#[command(name = "heatwave", about = "Urban heatwave forecaster")]
struct Cli {
    /// Data directory holding `raw/` and `processed/` (overrides `HEATWAVE_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the cities that can be fetched
    Cities,
    /// Fetch the 7-day forecast for a city
    Fetch {
        /// City name or identifier (e.g., "Athens")
        city: String,
    },
    /// Fetch 1991-2020 daily history for a city
    FetchHistorical {
        /// City name or identifier
        city: String,
    },
    /// Build 95th-percentile day-of-year thresholds from a city's history
    Climatology {
        /// City identifier
        city: String,
    },
    /// Flag threshold exceedances in a city's forecast and label heatwaves
    Detect {
        /// City identifier
        city: String,
        /// Minimum consecutive exceedance days that make a heatwave
        #[arg(long, default_value_t = DEFAULT_MIN_RUN)]
        min_run: usize,
    },
    /// Score a city's detected forecast with vulnerability escalation
    Assess {
        /// City identifier
        city: String,
    },
    /// Run fetch, climatology, detect, and assess for one or more cities
    Run {
        /// City names or identifiers
        #[arg(required = true)]
        cities: Vec<String>,
        /// Minimum consecutive exceedance days that make a heatwave
        #[arg(long, default_value_t = DEFAULT_MIN_RUN)]
        min_run: usize,
        /// Use files already on disk instead of downloading
        #[arg(long)]
        skip_fetch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = heatwave_cli_utils::init_logger();
    let cli = Cli::parse();

    let layout = cli
        .data_dir
        .map_or_else(DataLayout::from_env, DataLayout::new);
    log::debug!("Data directory: {}", layout.root().display());

    let Some(command) = cli.command else {
        return heatwave_cli::interactive::run(&multi, &layout).await;
    };

    match command {
        Commands::Cities => commands::list_cities(),
        Commands::Fetch { city } => commands::fetch(&layout, &city).await?,
        Commands::FetchHistorical { city } => {
            commands::fetch_historical(&multi, &layout, &city).await?;
        }
        Commands::Climatology { city } => commands::climatology(&layout, &city)?,
        Commands::Detect { city, min_run } => commands::detect(&layout, &city, min_run)?,
        Commands::Assess { city } => commands::assess(&layout, &city)?,
        Commands::Run {
            cities,
            min_run,
            skip_fetch,
        } => commands::run(&multi, &layout, &cities, min_run, skip_fetch).await?,
    }

    Ok(())
}

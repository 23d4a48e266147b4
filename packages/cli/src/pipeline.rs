//! File-level pipeline stages.
//!
//! Each stage reads its inputs from the [`DataLayout`], runs one core
//! transformation, and writes its output table back. Stages are
//! independent, so any of them can be rerun on its own once its inputs
//! exist.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use heatwave_fetch::progress::ProgressCallback;
use heatwave_fetch::{FetchError, OpenMeteoClient, forecast, historical};
use heatwave_tabular::{
    DataLayout, TableError, TableKind, read_climatology, read_daily_temperatures,
    read_detections, read_vulnerability, write_table_file,
};
use heatwave_weather_models::{
    City, ClimatologyEntry, DailyTemperatureRecord, DetectionRecord, RiskRecord, normalize_city,
};

/// Errors from running pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Reading or writing a table failed.
    #[error(transparent)]
    Table(#[from] TableError),

    /// Downloading weather data failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A stage input has not been produced yet.
    #[error("Missing input file {path} ({hint})")]
    MissingInput {
        /// Expected location of the file.
        path: String,
        /// How to produce it.
        hint: String,
    },
}

/// Settings for a full per-city run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Minimum consecutive exceedance days for a heatwave.
    pub min_run: usize,
    /// Reuse files already on disk instead of downloading.
    pub skip_fetch: bool,
    /// First local date kept from the forecast.
    pub today: NaiveDate,
}

/// Downloads the forecast for `city` and writes `raw/{city}_forecast.csv`.
///
/// # Errors
///
/// Returns [`PipelineError`] if the download or write fails.
pub async fn fetch_forecast(
    client: &OpenMeteoClient,
    layout: &DataLayout,
    city: &City,
    today: NaiveDate,
) -> Result<Vec<DailyTemperatureRecord>, PipelineError> {
    let records = forecast::fetch_forecast(client, city, today).await?;
    write_table_file(&layout.forecast(&city.id), &records)?;
    Ok(records)
}

/// Downloads the reference-period history for `city` and writes
/// `raw/{city}_historical.csv`.
///
/// # Errors
///
/// Returns [`PipelineError`] if the download or write fails.
pub async fn fetch_historical(
    client: &OpenMeteoClient,
    layout: &DataLayout,
    city: &City,
) -> Result<Vec<DailyTemperatureRecord>, PipelineError> {
    let records = historical::fetch_historical(client, city).await?;
    write_table_file(&layout.historical(&city.id), &records)?;
    Ok(records)
}

/// Builds the day-of-year climatology from the city's history.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] if the history has not been
/// fetched, or a table error if it cannot be read or the output written.
pub fn build_climatology(
    layout: &DataLayout,
    city: &str,
) -> Result<Vec<ClimatologyEntry>, PipelineError> {
    let city = normalize_city(city);
    let history = open_input(
        &layout.historical(&city),
        &format!("run `heatwave fetch-historical {city}`"),
    )?;
    let records = read_daily_temperatures(history, TableKind::Historical, &city)?;

    let climatology = heatwave_climatology::build_percentile_climatology(&city, &records);
    write_table_file(&layout.climatology(&city), &climatology)?;

    Ok(climatology)
}

/// Flags threshold exceedances in the forecast and labels heatwave runs.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] if the forecast or climatology
/// file is absent, or a table error if either cannot be read or the output
/// written.
pub fn detect(
    layout: &DataLayout,
    city: &str,
    min_run: usize,
) -> Result<Vec<DetectionRecord>, PipelineError> {
    let city = normalize_city(city);
    let forecast = open_input(
        &layout.forecast(&city),
        &format!("run `heatwave fetch {city}`"),
    )?;
    let climatology = open_input(
        &layout.climatology(&city),
        &format!("run `heatwave climatology {city}`"),
    )?;

    let forecast = read_daily_temperatures(forecast, TableKind::Forecast, &city)?;
    let climatology = read_climatology(climatology)?;

    let detections = heatwave_detect::detect_heatwaves(&forecast, &climatology, min_run);
    write_table_file(&layout.detections(&city), &detections)?;

    Ok(detections)
}

/// Scores the detected forecast against the shared vulnerability table.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] if the detection or vulnerability
/// file is absent, [`TableError::PrecursorMissing`] if the detection table
/// has no exceedance flag, or another table error on read/write failure.
pub fn assess(layout: &DataLayout, city: &str) -> Result<Vec<RiskRecord>, PipelineError> {
    let city = normalize_city(city);
    let detections = open_input(
        &layout.detections(&city),
        &format!("run `heatwave detect {city}`"),
    )?;
    let vulnerability = open_input(
        &layout.vulnerability(),
        "provide city, elderly_percent, density_per_km2, green_cover_percent",
    )?;

    let detections = read_detections(detections)?;
    let vulnerability = read_vulnerability(vulnerability)?;

    let risk = heatwave_risk::assess_heatwave_risk(&detections, &vulnerability);
    write_table_file(&layout.risk(&city), &risk)?;

    Ok(risk)
}

/// Runs every stage for one city: fetch, climatology, detect, assess.
///
/// The forecast is refetched unless `skip_fetch` is set. The history is
/// only fetched when no history file exists, since the reference period
/// never changes.
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage.
pub async fn run_city(
    client: &OpenMeteoClient,
    layout: &DataLayout,
    city: &City,
    options: &RunOptions,
) -> Result<Vec<RiskRecord>, PipelineError> {
    if !options.skip_fetch {
        if !layout.historical(&city.id).exists() {
            fetch_historical(client, layout, city).await?;
        }
        fetch_forecast(client, layout, city, options.today).await?;
    }

    build_climatology(layout, &city.id)?;
    detect(layout, &city.id, options.min_run)?;
    assess(layout, &city.id)
}

/// Runs [`run_city`] for each city in turn, reporting progress per city.
///
/// A failing city is logged and reported as `Err` without stopping the
/// others.
pub async fn run_cities(
    client: &OpenMeteoClient,
    layout: &DataLayout,
    cities: &[City],
    options: &RunOptions,
    progress: &dyn ProgressCallback,
) -> Vec<(City, Result<Vec<RiskRecord>, PipelineError>)> {
    progress.set_total(cities.len() as u64);

    let mut results = Vec::with_capacity(cities.len());
    for city in cities {
        progress.set_message(city.name.clone());
        let result = run_city(client, layout, city, options).await;
        if let Err(e) = &result {
            log::error!("{}: {e}", city.name);
        }
        results.push((city.clone(), result));
        progress.inc(1);
    }

    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    progress.finish(format!(
        "{} of {} city run(s) complete",
        cities.len() - failed,
        cities.len()
    ));

    results
}

fn open_input(path: &Path, hint: &str) -> Result<File, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.display().to_string(),
            hint: hint.to_string(),
        });
    }
    Ok(heatwave_tabular::read::open(path)?)
}

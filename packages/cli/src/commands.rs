//! Command implementations shared by the subcommands and the interactive
//! menu.

use std::sync::Arc;

use chrono::NaiveDate;
use heatwave_cli_utils::{IndicatifProgress, MultiProgress};
use heatwave_fetch::OpenMeteoClient;
use heatwave_fetch::progress::ProgressCallback;
use heatwave_fetch::registry::{all_cities, find_city};
use heatwave_tabular::DataLayout;
use heatwave_weather_models::normalize_city;

use crate::pipeline::{self, RunOptions};
use crate::report;

/// Result type of every command.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Prints the registered cities.
pub fn list_cities() {
    println!("{:<12} {:<12} {:<8} {:>9} {:>9}", "ID", "NAME", "COUNTRY", "LAT", "LON");
    println!("{}", "-".repeat(54));
    for city in all_cities() {
        println!(
            "{:<12} {:<12} {:<8} {:>9.4} {:>9.4}",
            city.id, city.name, city.country, city.latitude, city.longitude
        );
    }
}

/// Downloads the forecast for a registered city.
///
/// # Errors
///
/// Returns an error if the city is unknown or the download fails.
pub async fn fetch(layout: &DataLayout, city: &str) -> CommandResult {
    let city = find_city(city)?;
    let client = OpenMeteoClient::from_env()?;

    let records = pipeline::fetch_forecast(&client, layout, &city, today()).await?;
    println!(
        "Saved {} forecast day(s) to {}",
        records.len(),
        layout.forecast(&city.id).display()
    );
    Ok(())
}

/// Downloads the 1991-2020 history for a registered city.
///
/// # Errors
///
/// Returns an error if the city is unknown or the download fails.
pub async fn fetch_historical(
    multi: &MultiProgress,
    layout: &DataLayout,
    city: &str,
) -> CommandResult {
    let city = find_city(city)?;
    let client = OpenMeteoClient::from_env()?;

    let progress = IndicatifProgress::spinner(multi, &format!("Downloading {} archive", city.name));
    let result = pipeline::fetch_historical(&client, layout, &city).await;
    progress.finish(format!("{} archive done", city.name));

    let records = result?;
    println!(
        "Saved {} historical day(s) to {}",
        records.len(),
        layout.historical(&city.id).display()
    );
    Ok(())
}

/// Builds the climatology for a city from its history file.
///
/// # Errors
///
/// Returns an error if the history file is missing or malformed.
pub fn climatology(layout: &DataLayout, city: &str) -> CommandResult {
    let entries = pipeline::build_climatology(layout, city)?;
    println!(
        "Saved {} day-of-year threshold(s) to {}",
        entries.len(),
        layout.climatology(&normalize_city(city)).display()
    );
    Ok(())
}

/// Runs heatwave detection for a city.
///
/// # Errors
///
/// Returns an error if an input file is missing or malformed.
pub fn detect(layout: &DataLayout, city: &str, min_run: usize) -> CommandResult {
    let detections = pipeline::detect(layout, city, min_run)?;
    let events = heatwave_detect::summarize_events(&detections);

    println!(
        "Saved {} day(s) to {}",
        detections.len(),
        layout.detections(&normalize_city(city)).display()
    );
    if events.is_empty() {
        println!("No heatwave of {min_run}+ day(s) detected.");
    } else {
        print!("{}", report::event_list(&events));
    }
    Ok(())
}

/// Scores a city's detected forecast and prints the report.
///
/// # Errors
///
/// Returns an error if an input file is missing or malformed.
pub fn assess(layout: &DataLayout, city: &str) -> CommandResult {
    let risk = pipeline::assess(layout, city)?;
    println!("{}", report::city_report(&display_name(city), &risk));
    println!("Saved to {}", layout.risk(&normalize_city(city)).display());
    Ok(())
}

/// Runs the full pipeline for each registered city and prints a report
/// per city.
///
/// # Errors
///
/// Returns an error if a city is unknown, or after all cities have run if
/// any of them failed.
pub async fn run(
    multi: &MultiProgress,
    layout: &DataLayout,
    cities: &[String],
    min_run: usize,
    skip_fetch: bool,
) -> CommandResult {
    let cities = cities
        .iter()
        .map(|name| find_city(name.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let client = OpenMeteoClient::from_env()?;
    let options = RunOptions {
        min_run,
        skip_fetch,
        today: today(),
    };

    let progress: Arc<dyn ProgressCallback> =
        IndicatifProgress::cities_bar(multi, "Forecasting", cities.len() as u64);
    let results = pipeline::run_cities(&client, layout, &cities, &options, progress.as_ref()).await;

    let mut failed = Vec::new();
    for (city, result) in results {
        match result {
            Ok(risk) => println!("\n{}", report::city_report(&city.name, &risk)),
            Err(_) => failed.push(city.name),
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("pipeline failed for: {}", failed.join(", ")).into())
    }
}

/// Registry display name for `city`, or the name as given.
fn display_name(city: &str) -> String {
    find_city(city).map_or_else(|_| city.trim().to_string(), |found| found.name)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

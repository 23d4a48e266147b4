//! Menu-driven front end used when `heatwave` is started without a
//! subcommand.

use dialoguer::{Confirm, Input, MultiSelect, Select};
use heatwave_cli_utils::MultiProgress;
use heatwave_detect::DEFAULT_MIN_RUN;
use heatwave_fetch::registry::all_cities;
use heatwave_tabular::DataLayout;

use crate::commands::{self, CommandResult};

/// Top-level actions available in the interactive menu.
enum Action {
    RunPipeline,
    FetchForecast,
    FetchHistorical,
    BuildClimatology,
    DetectHeatwaves,
    AssessRisk,
    ListCities,
}

impl Action {
    const ALL: &[Self] = &[
        Self::RunPipeline,
        Self::FetchForecast,
        Self::FetchHistorical,
        Self::BuildClimatology,
        Self::DetectHeatwaves,
        Self::AssessRisk,
        Self::ListCities,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RunPipeline => "Run full forecast",
            Self::FetchForecast => "Fetch 7-day forecast",
            Self::FetchHistorical => "Fetch 1991-2020 history",
            Self::BuildClimatology => "Build climatology",
            Self::DetectHeatwaves => "Detect heatwaves",
            Self::AssessRisk => "Assess heat risk",
            Self::ListCities => "List cities",
        }
    }
}

/// Prompts for an action and its parameters, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected command fails.
pub async fn run(multi: &MultiProgress, layout: &DataLayout) -> CommandResult {
    println!("Urban Heatwave Forecaster");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::RunPipeline => {
            let cities = select_cities()?;
            if cities.is_empty() {
                println!("No cities selected.");
                return Ok(());
            }
            let min_run = prompt_min_run()?;
            let skip_fetch = Confirm::new()
                .with_prompt("Reuse data already on disk instead of fetching?")
                .default(false)
                .interact()?;
            commands::run(multi, layout, &cities, min_run, skip_fetch).await?;
        }
        Action::FetchForecast => commands::fetch(layout, &select_city()?).await?,
        Action::FetchHistorical => {
            commands::fetch_historical(multi, layout, &select_city()?).await?;
        }
        Action::BuildClimatology => commands::climatology(layout, &select_city()?)?,
        Action::DetectHeatwaves => {
            let city = select_city()?;
            commands::detect(layout, &city, prompt_min_run()?)?;
        }
        Action::AssessRisk => commands::assess(layout, &select_city()?)?,
        Action::ListCities => commands::list_cities(),
    }

    Ok(())
}

fn select_city() -> Result<String, dialoguer::Error> {
    let cities = all_cities();
    let labels: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
    let idx = Select::new()
        .with_prompt("City")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(cities[idx].id.clone())
}

fn select_cities() -> Result<Vec<String>, dialoguer::Error> {
    let cities = all_cities();
    let labels: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
    let defaults = vec![true; cities.len()];
    let selected = MultiSelect::new()
        .with_prompt("Cities (space=toggle, a=all, enter=confirm)")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;
    Ok(selected.into_iter().map(|i| cities[i].id.clone()).collect())
}

fn prompt_min_run() -> Result<usize, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt("Minimum consecutive hot days")
        .default(DEFAULT_MIN_RUN.to_string())
        .interact_text()?;
    Ok(input.trim().parse()?)
}

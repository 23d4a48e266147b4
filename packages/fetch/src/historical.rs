//! Daily temperature history from the Open-Meteo archive API.

use chrono::NaiveDate;
use heatwave_weather_models::{City, DailyTemperatureRecord};

use crate::{FetchError, OpenMeteoClient, build_url, check_api_error, json_array};

/// Archive API endpoint.
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// First day of the climatological reference period.
pub const REFERENCE_START: &str = "1991-01-01";

/// Last day of the climatological reference period.
pub const REFERENCE_END: &str = "2020-12-31";

/// Builds the archive request URL for `city` over the reference period.
///
/// # Errors
///
/// Returns [`FetchError::Response`] if the URL cannot be built.
pub fn archive_url(city: &City) -> Result<reqwest::Url, FetchError> {
    build_url(
        ARCHIVE_URL,
        &[
            ("latitude", city.latitude.to_string()),
            ("longitude", city.longitude.to_string()),
            ("start_date", REFERENCE_START.to_string()),
            ("end_date", REFERENCE_END.to_string()),
            (
                "daily",
                "temperature_2m_min,temperature_2m_max".to_string(),
            ),
            ("timezone", "auto".to_string()),
        ],
    )
}

/// Downloads the reference-period history for `city`.
///
/// Archive responses never change, so cached entries never expire.
///
/// # Errors
///
/// Returns [`FetchError`] if the request fails or the response is not the
/// expected daily payload.
pub async fn fetch_historical(
    client: &OpenMeteoClient,
    city: &City,
) -> Result<Vec<DailyTemperatureRecord>, FetchError> {
    let url = archive_url(city)?;
    let body = client.get_json(&url, None).await?;
    let records = parse_archive(&body, &city.id)?;

    log::info!(
        "{}: {} historical day(s) ({REFERENCE_START} to {REFERENCE_END})",
        city.name,
        records.len()
    );

    Ok(records)
}

/// Converts an archive payload into daily records.
///
/// Days with a null minimum or maximum are skipped and counted in a
/// warning.
///
/// # Errors
///
/// Returns [`FetchError::Response`] if the payload is an API error, lacks
/// one of the `daily` arrays, has arrays of different lengths, or contains
/// an unparseable date.
pub fn parse_archive(
    body: &serde_json::Value,
    city: &str,
) -> Result<Vec<DailyTemperatureRecord>, FetchError> {
    check_api_error(body)?;
    let daily = body.get("daily").ok_or_else(|| FetchError::Response {
        message: "Response is missing the 'daily' section".to_string(),
    })?;
    let times = json_array(daily, "time")?;
    let minimums = json_array(daily, "temperature_2m_min")?;
    let maximums = json_array(daily, "temperature_2m_max")?;

    if times.len() != minimums.len() || times.len() != maximums.len() {
        return Err(FetchError::Response {
            message: format!(
                "daily arrays differ in length: {} times, {} minimums, {} maximums",
                times.len(),
                minimums.len(),
                maximums.len()
            ),
        });
    }

    let mut records = Vec::with_capacity(times.len());
    let mut incomplete = 0usize;

    for ((time, tmin), tmax) in times.iter().zip(minimums).zip(maximums) {
        let date = time
            .as_str()
            .and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
            .ok_or_else(|| FetchError::Response {
                message: format!("Unparseable archive date: {time}"),
            })?;

        match (tmin.as_f64(), tmax.as_f64()) {
            (Some(tmin), Some(tmax)) => {
                records.push(DailyTemperatureRecord::new(date, tmin, tmax, city));
            }
            _ => incomplete += 1,
        }
    }

    if incomplete > 0 {
        log::warn!("{city}: skipped {incomplete} archive day(s) with missing temperatures");
    }

    Ok(records)
}

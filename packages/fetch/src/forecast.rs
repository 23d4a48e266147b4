//! Short-range forecast from the Open-Meteo forecast API.
//!
//! The API is asked for hourly 2 m temperature from the ECMWF IFS 0.25°
//! model in the city's local time zone. Hours are grouped by local date and
//! reduced to the daily minimum and maximum.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use heatwave_weather_models::{City, DailyTemperatureRecord};

use crate::{FetchError, OpenMeteoClient, build_url, check_api_error, json_array};

/// Forecast API endpoint.
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Forecast model requested from Open-Meteo.
pub const FORECAST_MODEL: &str = "ecmwf_ifs025";

/// Number of forecast days requested.
pub const FORECAST_DAYS: u32 = 7;

/// How long a cached forecast response stays fresh.
pub const FORECAST_TTL: Duration = Duration::from_secs(60 * 60);

/// Builds the forecast request URL for `city`.
///
/// # Errors
///
/// Returns [`FetchError::Response`] if the URL cannot be built.
pub fn forecast_url(city: &City) -> Result<reqwest::Url, FetchError> {
    build_url(
        FORECAST_URL,
        &[
            ("latitude", city.latitude.to_string()),
            ("longitude", city.longitude.to_string()),
            ("hourly", "temperature_2m".to_string()),
            ("models", FORECAST_MODEL.to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
            ("timezone", "auto".to_string()),
        ],
    )
}

/// Downloads the forecast for `city` and returns one record per local date
/// from `today` onwards.
///
/// # Errors
///
/// Returns [`FetchError`] if the request fails or the response is not the
/// expected hourly payload.
pub async fn fetch_forecast(
    client: &OpenMeteoClient,
    city: &City,
    today: NaiveDate,
) -> Result<Vec<DailyTemperatureRecord>, FetchError> {
    let url = forecast_url(city)?;
    let body = client.get_json(&url, Some(FORECAST_TTL)).await?;
    let records = aggregate_hourly(&body, &city.id, today)?;

    log::info!(
        "{}: {} forecast day(s) from {today}",
        city.name,
        records.len()
    );

    Ok(records)
}

/// Reduces an hourly forecast payload to daily min/max per local date.
///
/// Null hours are skipped; a date whose hours are all null is dropped.
/// Dates before `today` are dropped.
///
/// # Errors
///
/// Returns [`FetchError::Response`] if the payload is an API error, lacks
/// the `hourly.time` or `hourly.temperature_2m` arrays, has arrays of
/// different lengths, or contains an unparseable timestamp.
pub fn aggregate_hourly(
    body: &serde_json::Value,
    city: &str,
    today: NaiveDate,
) -> Result<Vec<DailyTemperatureRecord>, FetchError> {
    check_api_error(body)?;
    let hourly = body.get("hourly").ok_or_else(|| FetchError::Response {
        message: "Response is missing the 'hourly' section".to_string(),
    })?;
    let times = json_array(hourly, "time")?;
    let temperatures = json_array(hourly, "temperature_2m")?;

    if times.len() != temperatures.len() {
        return Err(FetchError::Response {
            message: format!(
                "hourly arrays differ in length: {} times, {} temperatures",
                times.len(),
                temperatures.len()
            ),
        });
    }

    let mut daily: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    let mut null_hours = 0usize;

    for (time, temperature) in times.iter().zip(temperatures) {
        let date = local_date(time)?;
        let Some(value) = temperature.as_f64() else {
            null_hours += 1;
            continue;
        };
        daily
            .entry(date)
            .and_modify(|(min, max)| {
                *min = min.min(value);
                *max = max.max(value);
            })
            .or_insert((value, value));
    }

    if null_hours > 0 {
        log::debug!("{city}: skipped {null_hours} null forecast hour(s)");
    }

    Ok(daily
        .into_iter()
        .filter(|(date, _)| *date >= today)
        .map(|(date, (tmin, tmax))| DailyTemperatureRecord::new(date, tmin, tmax, city))
        .collect())
}

/// Parses the local date out of an Open-Meteo `YYYY-MM-DDTHH:MM` timestamp.
fn local_date(time: &serde_json::Value) -> Result<NaiveDate, FetchError> {
    let text = time.as_str().unwrap_or_default();
    let date_part = text.split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| FetchError::Response {
        message: format!("Unparseable forecast timestamp: {time}"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn url_carries_model_and_location() {
        let city = City {
            id: "athens".to_string(),
            name: "Athens".to_string(),
            country: "GR".to_string(),
            latitude: 37.9838,
            longitude: 23.7278,
        };
        let url = forecast_url(&city).unwrap();
        let query = url.query().unwrap();

        assert!(url.as_str().starts_with(FORECAST_URL));
        assert!(query.contains("latitude=37.9838"));
        assert!(query.contains("longitude=23.7278"));
        assert!(query.contains("hourly=temperature_2m"));
        assert!(query.contains("models=ecmwf_ifs025"));
        assert!(query.contains("forecast_days=7"));
        assert!(query.contains("timezone=auto"));
    }

    #[test]
    fn reduces_hours_to_daily_extremes() {
        let body = json!({
            "hourly": {
                "time": [
                    "2024-07-01T00:00", "2024-07-01T12:00", "2024-07-01T23:00",
                    "2024-07-02T03:00", "2024-07-02T15:00"
                ],
                "temperature_2m": [24.1, 36.5, 27.0, 22.4, 38.2]
            }
        });
        let records = aggregate_hourly(&body, "Athens", date(1)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(1));
        assert!((records[0].tmin - 24.1).abs() < f64::EPSILON);
        assert!((records[0].tmax - 36.5).abs() < f64::EPSILON);
        assert!((records[1].tmin - 22.4).abs() < f64::EPSILON);
        assert!((records[1].tmax - 38.2).abs() < f64::EPSILON);
        assert_eq!(records[1].city, "athens");
    }

    #[test]
    fn drops_days_before_today() {
        let body = json!({
            "hourly": {
                "time": ["2024-06-30T23:00", "2024-07-01T00:00"],
                "temperature_2m": [20.0, 21.0]
            }
        });
        let records = aggregate_hourly(&body, "rome", date(1)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, date(1));
    }

    #[test]
    fn skips_null_hours_and_empty_days() {
        let body = json!({
            "hourly": {
                "time": ["2024-07-01T00:00", "2024-07-01T01:00", "2024-07-02T00:00"],
                "temperature_2m": [null, 25.5, null]
            }
        });
        let records = aggregate_hourly(&body, "rome", date(1)).unwrap();
        assert_eq!(records.len(), 1);
        assert!((records[0].tmin - 25.5).abs() < f64::EPSILON);
        assert!((records[0].tmax - 25.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_mismatched_arrays() {
        let body = json!({
            "hourly": {"time": ["2024-07-01T00:00"], "temperature_2m": []}
        });
        assert!(matches!(
            aggregate_hourly(&body, "rome", date(1)),
            Err(FetchError::Response { .. })
        ));
    }

    #[test]
    fn rejects_missing_hourly_section() {
        let body = json!({"daily": {}});
        assert!(aggregate_hourly(&body, "rome", date(1)).is_err());
    }

    #[test]
    fn rejects_bad_timestamp() {
        let body = json!({
            "hourly": {"time": ["yesterday"], "temperature_2m": [20.0]}
        });
        assert!(aggregate_hourly(&body, "rome", date(1)).is_err());
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Heatwave detection over a daily forecast.
//!
//! A forecast day *exceeds* when both its minimum and maximum temperature
//! are strictly above the 95th-percentile thresholds for its day of year.
//! A *heatwave* is a maximal run of consecutive exceeding days at least
//! `min_run` days long; every day in it shares one `heatwave_id`.
//!
//! Runs are formed in row order. A run additionally ends whenever the next
//! row is not the calendar day after the previous one (or is for a
//! different city), so a gap in the forecast can never be bridged by a
//! heatwave. For a date-sorted, gap-free forecast this is exactly row-order
//! grouping.

pub mod events;
pub mod runs;

use std::collections::BTreeMap;

use heatwave_weather_models::{ClimatologyEntry, DailyTemperatureRecord, DetectionRecord};

pub use events::{HeatwaveEvent, summarize_events};
pub use runs::{assign_run_ids, group_runs};

/// Minimum number of consecutive exceeding days that form a heatwave.
pub const DEFAULT_MIN_RUN: usize = 3;

/// Flags each forecast day against `climatology` and groups exceeding days
/// into heatwave events.
///
/// Every forecast row appears in the output, in input order. Days whose
/// day-of-year has no climatology entry never exceed. The forecast is not
/// re-sorted; callers should pass it ordered by date.
#[must_use]
pub fn detect_heatwaves(
    forecast: &[DailyTemperatureRecord],
    climatology: &[ClimatologyEntry],
    min_run: usize,
) -> Vec<DetectionRecord> {
    let thresholds = index_climatology(climatology);

    let flags: Vec<bool> = forecast
        .iter()
        .map(|record| {
            let entry = thresholds.get(&record.day_of_year()).copied();
            exceeds_thresholds(record, entry)
        })
        .collect();

    let unmatched = forecast
        .iter()
        .filter(|record| !thresholds.contains_key(&record.day_of_year()))
        .count();
    if unmatched > 0 {
        log::warn!("{unmatched} forecast day(s) have no climatology thresholds");
    }

    let continues: Vec<bool> = forecast
        .iter()
        .enumerate()
        .map(|(i, record)| i > 0 && is_next_day(&forecast[i - 1], record))
        .collect();

    let ids = assign_run_ids(&flags, &continues, min_run);

    let detections: Vec<DetectionRecord> = forecast
        .iter()
        .zip(flags)
        .zip(ids)
        .map(|((record, exceeds_95p), heatwave_id)| DetectionRecord {
            date: record.date,
            tmin: record.tmin,
            tmax: record.tmax,
            city: record.city.clone(),
            exceeds_95p,
            heatwave_id,
        })
        .collect();

    log::info!(
        "Detected {} heatwave day(s) across {} forecast day(s) (min_run={min_run})",
        detections.iter().filter(|d| d.in_heatwave()).count(),
        detections.len()
    );

    detections
}

/// Returns `true` if both temperatures are strictly above the thresholds.
///
/// A missing entry means there is nothing to exceed, so the result is
/// `false`.
#[must_use]
pub fn exceeds_thresholds(
    record: &DailyTemperatureRecord,
    thresholds: Option<&ClimatologyEntry>,
) -> bool {
    thresholds.is_some_and(|entry| record.tmin > entry.tmin_95p && record.tmax > entry.tmax_95p)
}

/// Indexes climatology entries by day of year. The first entry wins if a
/// day appears more than once.
fn index_climatology(climatology: &[ClimatologyEntry]) -> BTreeMap<u32, &ClimatologyEntry> {
    let mut index = BTreeMap::new();
    for entry in climatology {
        if index.contains_key(&entry.day_of_year) {
            log::warn!(
                "Duplicate climatology entry for day {} ignored",
                entry.day_of_year
            );
            continue;
        }
        index.insert(entry.day_of_year, entry);
    }
    index
}

fn is_next_day(previous: &DailyTemperatureRecord, current: &DailyTemperatureRecord) -> bool {
    previous.city == current.city && previous.date.succ_opt() == Some(current.date)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(d: u32, tmin: f64, tmax: f64) -> DailyTemperatureRecord {
        DailyTemperatureRecord::new(
            NaiveDate::from_ymd_opt(2024, 7, d).unwrap(),
            tmin,
            tmax,
            "athens",
        )
    }

    /// Flat thresholds of 25/35 for every day in July 2024.
    fn july_climatology() -> Vec<ClimatologyEntry> {
        (183..=213)
            .map(|day_of_year| ClimatologyEntry {
                day_of_year,
                tmin_95p: 25.0,
                tmax_95p: 35.0,
            })
            .collect()
    }

    fn hot(d: u32) -> DailyTemperatureRecord {
        day(d, 27.0, 38.0)
    }

    fn mild(d: u32) -> DailyTemperatureRecord {
        day(d, 20.0, 30.0)
    }

    #[test]
    fn four_day_run_shares_an_id_and_two_day_run_gets_none() {
        let forecast = vec![
            hot(1),
            hot(2),
            hot(3),
            hot(4),
            mild(5),
            hot(6),
            hot(7),
            mild(8),
        ];
        let out = detect_heatwaves(&forecast, &july_climatology(), DEFAULT_MIN_RUN);

        let ids: Vec<Option<u32>> = out.iter().map(|d| d.heatwave_id).collect();
        let first = ids[0].unwrap();
        assert!(ids[..4].iter().all(|id| *id == Some(first)));
        assert!(ids[4..].iter().all(Option::is_none));
        assert!(out[5].exceeds_95p && out[6].exceeds_95p);
    }

    #[test]
    fn both_thresholds_must_be_exceeded() {
        let forecast = vec![day(1, 27.0, 34.0), day(2, 24.0, 38.0), day(3, 25.0, 35.0)];
        let out = detect_heatwaves(&forecast, &july_climatology(), 1);
        assert!(out.iter().all(|d| !d.exceeds_95p));
        assert!(out.iter().all(|d| d.heatwave_id.is_none()));
    }

    #[test]
    fn unmatched_days_never_exceed() {
        let forecast = vec![hot(1), hot(2), hot(3)];
        let out = detect_heatwaves(&forecast, &[], 1);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|d| !d.exceeds_95p && d.heatwave_id.is_none()));
    }

    #[test]
    fn run_of_exactly_min_run_qualifies() {
        let forecast = vec![mild(1), hot(2), hot(3), hot(4), mild(5)];
        let out = detect_heatwaves(&forecast, &july_climatology(), 3);
        assert_eq!(out.iter().filter(|d| d.in_heatwave()).count(), 3);
    }

    #[test]
    fn min_run_above_longest_run_yields_no_ids() {
        let forecast = vec![hot(1), hot(2), hot(3), mild(4), hot(5)];
        let out = detect_heatwaves(&forecast, &july_climatology(), 4);
        assert!(out.iter().all(|d| d.heatwave_id.is_none()));
    }

    #[test]
    fn empty_forecast_gives_empty_output() {
        assert!(detect_heatwaves(&[], &july_climatology(), DEFAULT_MIN_RUN).is_empty());
    }

    #[test]
    fn calendar_gap_splits_a_run() {
        let forecast = vec![hot(1), hot(2), hot(4), hot(5)];
        let out = detect_heatwaves(&forecast, &july_climatology(), 3);
        assert!(out.iter().all(|d| d.heatwave_id.is_none()));

        let out = detect_heatwaves(&forecast, &july_climatology(), 2);
        assert!(out[0].heatwave_id.is_some());
        assert_ne!(out[1].heatwave_id, out[2].heatwave_id);
    }

    #[test]
    fn preserves_row_count_order_and_fields() {
        let forecast = vec![mild(3), hot(4), hot(5)];
        let out = detect_heatwaves(&forecast, &july_climatology(), 3);
        assert_eq!(out.len(), forecast.len());
        for (input, output) in forecast.iter().zip(&out) {
            assert_eq!(input.date, output.date);
            assert_eq!(input.city, output.city);
            assert!((input.tmin - output.tmin).abs() < f64::EPSILON);
            assert!((input.tmax - output.tmax).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn detection_is_repeatable() {
        let forecast = vec![hot(1), hot(2), hot(3), mild(4), hot(5), hot(6), hot(7)];
        let climatology = july_climatology();
        assert_eq!(
            detect_heatwaves(&forecast, &climatology, 3),
            detect_heatwaves(&forecast, &climatology, 3)
        );
    }

    #[test]
    fn duplicate_climatology_day_uses_first_entry() {
        let climatology = vec![
            ClimatologyEntry {
                day_of_year: 183,
                tmin_95p: 10.0,
                tmax_95p: 20.0,
            },
            ClimatologyEntry {
                day_of_year: 183,
                tmin_95p: 40.0,
                tmax_95p: 50.0,
            },
        ];
        let out = detect_heatwaves(&[hot(1)], &climatology, 1);
        assert!(out[0].exceeds_95p);
    }
}

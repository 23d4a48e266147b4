#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Climatology baseline builder.
//!
//! Reduces a multi-decade history of daily minimum/maximum temperatures for
//! one city into per-day-of-year 95th-percentile thresholds. The thresholds
//! are what the detector compares forecast days against.
//!
//! Day-of-year 366 is dropped before aggregation, so the output never has
//! more than 365 entries. Days with no samples are simply absent.

use std::collections::BTreeMap;

use heatwave_weather_models::{
    ClimatologyEntry, DailyTemperatureRecord, LEAP_DAY_OF_YEAR, normalize_city,
};

/// Quantile used for both the `tmin` and `tmax` thresholds.
pub const CLIMATOLOGY_QUANTILE: f64 = 0.95;

/// Number of decimal places thresholds are rounded to.
pub const THRESHOLD_DECIMALS: usize = 2;

/// Day-of-year groups with fewer samples than this are reported as sparse.
pub const MIN_ROBUST_SAMPLES: usize = 29;

/// Builds the 95th-percentile climatology for `city` from its historical
/// daily records.
///
/// Records are grouped by day-of-year (leap-year day 366 excluded) and the
/// 95th percentile of `tmin` and `tmax` is computed independently for each
/// group using linear interpolation, then rounded to two decimals. The
/// result is sorted by day-of-year.
///
/// Sparse input is not an error: percentiles are computed from however many
/// samples exist, and a warning is logged for under-sampled days.
#[must_use]
pub fn build_percentile_climatology(
    city: &str,
    records: &[DailyTemperatureRecord],
) -> Vec<ClimatologyEntry> {
    let city = normalize_city(city);

    let mut by_day: BTreeMap<u32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    let mut leap_days = 0usize;
    let mut foreign = 0usize;

    for record in records {
        if record.city != city {
            foreign += 1;
        }

        let day_of_year = record.day_of_year();
        if day_of_year == LEAP_DAY_OF_YEAR {
            leap_days += 1;
            continue;
        }

        let (tmins, tmaxs) = by_day.entry(day_of_year).or_default();
        tmins.push(record.tmin);
        tmaxs.push(record.tmax);
    }

    if foreign > 0 {
        log::warn!("{city}: {foreign} historical record(s) labelled with a different city");
    }
    log::debug!("{city}: dropped {leap_days} record(s) for day-of-year {LEAP_DAY_OF_YEAR}");

    let sparse = by_day
        .values()
        .filter(|(tmins, _)| tmins.len() < MIN_ROBUST_SAMPLES)
        .count();
    if sparse > 0 {
        log::warn!(
            "{city}: {sparse} day(s) of year have fewer than {MIN_ROBUST_SAMPLES} samples; \
             thresholds for those days are imprecise"
        );
    }

    let climatology: Vec<ClimatologyEntry> = by_day
        .into_iter()
        .filter_map(|(day_of_year, (mut tmins, mut tmaxs))| {
            let tmin_95p = percentile(&mut tmins, CLIMATOLOGY_QUANTILE)?;
            let tmax_95p = percentile(&mut tmaxs, CLIMATOLOGY_QUANTILE)?;
            Some(ClimatologyEntry {
                day_of_year,
                tmin_95p: round_to(tmin_95p, THRESHOLD_DECIMALS),
                tmax_95p: round_to(tmax_95p, THRESHOLD_DECIMALS),
            })
        })
        .collect();

    log::info!(
        "{city}: built climatology for {} day(s) of year from {} record(s)",
        climatology.len(),
        records.len()
    );

    climatology
}

/// Computes the `quantile` (0.0–1.0) of `values` with linear interpolation
/// between the two closest ranks.
///
/// Sorts `values` in place. Returns `None` for an empty slice.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn percentile(values: &mut [f64], quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);

    let rank = (values.len() - 1) as f64 * quantile.clamp(0.0, 1.0);
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(values.len() - 1);
    let fraction = rank - rank.floor();

    Some(values[lower] + fraction * (values[upper] - values[lower]))
}

/// Rounds `value` to `decimals` decimal places.
///
/// Rounds the exact binary value: an interpolated `32.815` stored just
/// below the tie becomes `32.81`, where scaling by a power of ten first
/// would round it up.
#[must_use]
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(year: i32, ordinal: u32, tmin: f64, tmax: f64) -> DailyTemperatureRecord {
        DailyTemperatureRecord::new(
            NaiveDate::from_yo_opt(year, ordinal).unwrap(),
            tmin,
            tmax,
            "athens",
        )
    }

    #[test]
    fn identical_samples_give_identical_thresholds() {
        let records: Vec<_> = (1991..2021).map(|y| record(y, 200, 20.0, 30.0)).collect();
        let climatology = build_percentile_climatology("Athens", &records);

        assert_eq!(climatology.len(), 1);
        assert_eq!(climatology[0].day_of_year, 200);
        assert!((climatology[0].tmin_95p - 20.0).abs() < f64::EPSILON);
        assert!((climatology[0].tmax_95p - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn never_emits_day_366() {
        let records = vec![
            record(2020, 366, 10.0, 15.0),
            record(2016, 366, 11.0, 16.0),
            record(2019, 365, 9.0, 14.0),
        ];
        let climatology = build_percentile_climatology("athens", &records);

        assert!(climatology.iter().all(|e| e.day_of_year != LEAP_DAY_OF_YEAR));
        assert_eq!(climatology.len(), 1);
        assert_eq!(climatology[0].day_of_year, 365);
    }

    #[test]
    fn missing_days_are_not_synthesized() {
        let records = vec![record(2000, 10, 1.0, 2.0), record(2000, 12, 3.0, 4.0)];
        let days: Vec<u32> = build_percentile_climatology("athens", &records)
            .iter()
            .map(|e| e.day_of_year)
            .collect();
        assert_eq!(days, vec![10, 12]);
    }

    #[test]
    fn empty_history_gives_empty_climatology() {
        assert!(build_percentile_climatology("athens", &[]).is_empty());
    }

    #[test]
    fn percentile_interpolates_linearly() {
        // 1..=20: rank = 19 * 0.95 = 18.05 -> 19 + 0.05 * (20 - 19)
        let mut values: Vec<f64> = (1..=20).map(f64::from).collect();
        let p = percentile(&mut values, 0.95).unwrap();
        assert!((p - 19.05).abs() < 1e-9);
    }

    #[test]
    fn percentile_ignores_input_order() {
        let mut a = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        let mut b = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&mut a, 0.95), percentile(&mut b, 0.95));
    }

    #[test]
    fn percentile_of_single_sample_is_the_sample() {
        assert_eq!(percentile(&mut [12.5], 0.95), Some(12.5));
        assert_eq!(percentile(&mut Vec::new(), 0.95), None);
    }

    #[test]
    fn thresholds_never_exceed_the_sample_maximum() {
        let records: Vec<_> = (0..30)
            .map(|i| record(1991 + i, 180, f64::from(i) * 0.7, 25.0 + f64::from(i) * 1.3))
            .collect();
        let entry = build_percentile_climatology("athens", &records)[0];

        let max_tmin = records.iter().map(|r| r.tmin).fold(f64::MIN, f64::max);
        let max_tmax = records.iter().map(|r| r.tmax).fold(f64::MIN, f64::max);
        assert!(entry.tmin_95p <= max_tmin);
        assert!(entry.tmax_95p <= max_tmax);
    }

    #[test]
    fn hotter_sample_never_lowers_the_threshold() {
        let mut records: Vec<_> = (0..29)
            .map(|i| record(1991 + i, 180, 18.0 + f64::from(i % 5), 30.0 + f64::from(i % 7)))
            .collect();
        let before = build_percentile_climatology("athens", &records)[0];

        records.push(record(2020, 180, 40.0, 50.0));
        let after = build_percentile_climatology("athens", &records)[0];

        assert!(after.tmin_95p >= before.tmin_95p);
        assert!(after.tmax_95p >= before.tmax_95p);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let records = vec![
            record(2000, 50, 1.0, 1.0),
            record(2001, 50, 1.0 / 3.0, 2.0 / 3.0),
        ];
        let entry = build_percentile_climatology("athens", &records)[0];
        assert!((entry.tmin_95p - round_to(entry.tmin_95p, 2)).abs() < f64::EPSILON);
        assert!((entry.tmin_95p - 0.97).abs() < 1e-9);
    }

    #[test]
    fn rounding_follows_the_exact_interpolated_value() {
        // rank 27.55 between 32.1 and 33.4 interpolates to just under 32.815.
        let mut records: Vec<_> = (0..27)
            .map(|i| record(1991 + i, 180, 15.0, 20.0))
            .collect();
        records.push(record(2018, 180, 15.0, 32.1));
        records.push(record(2019, 180, 15.0, 33.4));
        records.push(record(2020, 180, 15.0, 34.0));

        let entry = build_percentile_climatology("athens", &records)[0];
        assert!((entry.tmax_95p - 32.81).abs() < 1e-9);
        assert!((entry.tmin_95p - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn round_to_keeps_exact_decimals() {
        assert!((round_to(32.814_999_9, 2) - 32.81).abs() < 1e-9);
        assert!((round_to(1.005_000_1, 2) - 1.01).abs() < 1e-9);
        assert!((round_to(-2.346, 2) + 2.35).abs() < 1e-9);
    }

    #[test]
    fn rebuilding_is_deterministic() {
        let records: Vec<_> = (0..30u32)
            .map(|i| {
                let year = 1991 + i32::try_from(i).unwrap();
                record(year, 1 + (i * 7) % 365, f64::from(i), f64::from(i) + 10.0)
            })
            .collect();
        assert_eq!(
            build_percentile_climatology("athens", &records),
            build_percentile_climatology("athens", &records)
        );
    }
}

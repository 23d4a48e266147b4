#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Table row types shared by every stage of the heatwave pipeline.
//!
//! Each stage consumes one of these row types and produces a new, augmented
//! one: [`DailyTemperatureRecord`] feeds the climatology builder and the
//! detector, [`DetectionRecord`] feeds the risk scorer, and [`RiskRecord`] is
//! the final output. None of the stages mutate their inputs.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Day-of-year value that only exists in leap years. Excluded from the
/// climatology baseline.
pub const LEAP_DAY_OF_YEAR: u32 = 366;

/// Normalizes a city identifier for joining: surrounding whitespace is
/// trimmed and the result is lowercased.
#[must_use]
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

/// One day of observed or forecast temperatures for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperatureRecord {
    /// Local calendar date.
    pub date: NaiveDate,
    /// Daily minimum temperature in °C.
    pub tmin: f64,
    /// Daily maximum temperature in °C.
    pub tmax: f64,
    /// Normalized city identifier.
    pub city: String,
}

impl DailyTemperatureRecord {
    /// Creates a record, normalizing the city identifier.
    #[must_use]
    pub fn new(date: NaiveDate, tmin: f64, tmax: f64, city: &str) -> Self {
        Self {
            date,
            tmin,
            tmax,
            city: normalize_city(city),
        }
    }

    /// Returns the 1-based position of [`Self::date`] within its year
    /// (1–366).
    #[must_use]
    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }
}

/// 95th-percentile temperature thresholds for one day of the year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimatologyEntry {
    /// Day of the year (1–365).
    pub day_of_year: u32,
    /// 95th percentile of historical daily minimums, rounded to 2 decimals.
    pub tmin_95p: f64,
    /// 95th percentile of historical daily maximums, rounded to 2 decimals.
    pub tmax_95p: f64,
}

/// A forecast day annotated with its threshold exceedance and heatwave
/// membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Local calendar date.
    pub date: NaiveDate,
    /// Daily minimum temperature in °C.
    pub tmin: f64,
    /// Daily maximum temperature in °C.
    pub tmax: f64,
    /// Normalized city identifier.
    pub city: String,
    /// Whether both `tmin` and `tmax` exceeded their 95th-percentile
    /// thresholds. `false` when no thresholds exist for the day.
    pub exceeds_95p: bool,
    /// Identifier of the heatwave event this day belongs to, if any.
    pub heatwave_id: Option<u32>,
}

impl DetectionRecord {
    /// Returns `true` if this day is part of a qualifying heatwave event.
    #[must_use]
    pub const fn in_heatwave(&self) -> bool {
        self.heatwave_id.is_some()
    }
}

/// Static urban vulnerability attributes for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityProfile {
    /// Normalized city identifier.
    pub city: String,
    /// Share of the population aged 65 and over, in percent.
    pub elderly_percent: f64,
    /// Population density in people per km².
    pub density_per_km2: f64,
    /// Share of the urban area covered by vegetation, in percent.
    pub green_cover_percent: f64,
}

/// Discrete heat risk tier, ordered from lowest to highest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskLevel {
    /// Below 30 °C.
    None = 0,
    /// 30 °C up to 32 °C.
    Mild = 1,
    /// 32 °C up to 35 °C.
    Moderate = 2,
    /// 35 °C up to 38 °C.
    High = 3,
    /// 38 °C and above.
    Extreme = 4,
}

impl RiskLevel {
    /// Returns the ordinal value of this tier (0–4).
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Moves the tier one step up, saturating at [`Self::Extreme`].
    #[must_use]
    pub const fn escalate(self) -> Self {
        match self {
            Self::None => Self::Mild,
            Self::Mild => Self::Moderate,
            Self::Moderate => Self::High,
            Self::High | Self::Extreme => Self::Extreme,
        }
    }

    /// Returns all variants in ascending order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::None,
            Self::Mild,
            Self::Moderate,
            Self::High,
            Self::Extreme,
        ]
    }
}

/// A detection row enriched with vulnerability attributes and a risk tier.
///
/// Vulnerability fields are `None` when the city has no vulnerability
/// profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    /// Local calendar date.
    pub date: NaiveDate,
    /// Daily minimum temperature in °C.
    pub tmin: f64,
    /// Daily maximum temperature in °C.
    pub tmax: f64,
    /// Normalized city identifier.
    pub city: String,
    /// Threshold exceedance flag carried over from detection.
    pub exceeds_95p: bool,
    /// Heatwave event identifier carried over from detection.
    pub heatwave_id: Option<u32>,
    /// Elderly population share, if known.
    pub elderly_percent: Option<f64>,
    /// Population density, if known.
    pub density_per_km2: Option<f64>,
    /// Green cover share, if known.
    pub green_cover_percent: Option<f64>,
    /// Risk tier after vulnerability escalation.
    pub risk_level: RiskLevel,
    /// Whether any vulnerability attribute crossed its threshold.
    pub high_vulnerability: bool,
}

/// A city the forecaster knows how to fetch weather for.
///
/// Loaded from the embedded city registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Normalized identifier, used in file names and table `city` columns.
    pub id: String,
    /// Display name.
    pub name: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn normalizes_city_case_and_whitespace() {
        assert_eq!(normalize_city("  Athens \t"), "athens");
        assert_eq!(normalize_city("STOCKHOLM"), "stockholm");
    }

    #[test]
    fn day_of_year_counts_leap_days() {
        let record = DailyTemperatureRecord::new(
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            1.0,
            5.0,
            "Rome",
        );
        assert_eq!(record.day_of_year(), LEAP_DAY_OF_YEAR);
        assert_eq!(record.city, "rome");
    }

    #[test]
    fn escalation_never_lowers_a_tier() {
        for level in RiskLevel::all() {
            assert!(level.escalate() >= *level, "{level:?} escalated downwards");
        }
    }

    #[test]
    fn extreme_is_a_fixed_point() {
        assert_eq!(RiskLevel::Extreme.escalate(), RiskLevel::Extreme);
        assert_eq!(RiskLevel::High.escalate(), RiskLevel::Extreme);
    }

    #[test]
    fn escalation_moves_exactly_one_step_below_the_cap() {
        for level in &RiskLevel::all()[..4] {
            assert_eq!(level.escalate().value(), level.value() + 1);
        }
    }

    #[test]
    fn risk_level_string_forms() {
        assert_eq!(RiskLevel::None.to_string(), "None");
        assert_eq!(RiskLevel::from_str("Moderate").unwrap(), RiskLevel::Moderate);
        assert!(RiskLevel::from_str("Severe").is_err());
    }
}

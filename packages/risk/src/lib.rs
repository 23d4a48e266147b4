#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Heat risk scoring.
//!
//! Each detected day gets a base [`RiskLevel`] from its maximum temperature,
//! which is then raised by one tier when the city's static vulnerability
//! profile is flagged as high (many elderly residents, dense population, or
//! little green cover). Escalation is applied once and saturates at
//! [`RiskLevel::Extreme`].

pub mod summary;

use std::collections::BTreeMap;

use heatwave_weather_models::{
    DetectionRecord, RiskLevel, RiskRecord, VulnerabilityProfile, normalize_city,
};

pub use summary::{RiskSummary, summarize_risk};

/// Base tiers by inclusive lower `tmax` bound (°C), highest first.
pub const TMAX_TIERS: &[(f64, RiskLevel)] = &[
    (38.0, RiskLevel::Extreme),
    (35.0, RiskLevel::High),
    (32.0, RiskLevel::Moderate),
    (30.0, RiskLevel::Mild),
];

/// Elderly population share (%) above which a city is highly vulnerable.
pub const ELDERLY_PERCENT_LIMIT: f64 = 20.0;

/// Population density (people/km²) above which a city is highly vulnerable.
pub const DENSITY_PER_KM2_LIMIT: f64 = 2000.0;

/// Green cover share (%) below which a city is highly vulnerable.
pub const GREEN_COVER_PERCENT_LIMIT: f64 = 25.0;

/// Maps a daily maximum temperature to its un-escalated risk tier.
#[must_use]
pub fn base_risk_level(tmax: f64) -> RiskLevel {
    TMAX_TIERS
        .iter()
        .find(|(lower, _)| tmax >= *lower)
        .map_or(RiskLevel::None, |(_, level)| *level)
}

/// Returns `true` if any vulnerability attribute crosses its limit.
///
/// A missing profile is never highly vulnerable.
#[must_use]
pub fn is_high_vulnerability(profile: Option<&VulnerabilityProfile>) -> bool {
    profile.is_some_and(|p| {
        p.elderly_percent > ELDERLY_PERCENT_LIMIT
            || p.density_per_km2 > DENSITY_PER_KM2_LIMIT
            || p.green_cover_percent < GREEN_COVER_PERCENT_LIMIT
    })
}

/// Scores every detection row and merges in its city's vulnerability
/// attributes.
///
/// City names are normalized on both sides before joining, and the output
/// carries the normalized name. Rows for cities without a profile keep
/// their base tier and have empty vulnerability fields.
#[must_use]
pub fn assess_heatwave_risk(
    detections: &[DetectionRecord],
    vulnerability: &[VulnerabilityProfile],
) -> Vec<RiskRecord> {
    let profiles = index_profiles(vulnerability);

    let unknown = unknown_cities(detections, &profiles);
    if !unknown.is_empty() {
        log::warn!("No vulnerability profile for: {}", unknown.join(", "));
    }

    detections
        .iter()
        .map(|detection| {
            let city = normalize_city(&detection.city);
            let profile = profiles.get(city.as_str()).copied();

            let high_vulnerability = is_high_vulnerability(profile);
            let base = base_risk_level(detection.tmax);
            let risk_level = if high_vulnerability {
                base.escalate()
            } else {
                base
            };

            RiskRecord {
                date: detection.date,
                tmin: detection.tmin,
                tmax: detection.tmax,
                city,
                exceeds_95p: detection.exceeds_95p,
                heatwave_id: detection.heatwave_id,
                elderly_percent: profile.map(|p| p.elderly_percent),
                density_per_km2: profile.map(|p| p.density_per_km2),
                green_cover_percent: profile.map(|p| p.green_cover_percent),
                risk_level,
                high_vulnerability,
            }
        })
        .collect()
}

/// Normalized detection cities with no profile, in first-seen order.
fn unknown_cities(
    detections: &[DetectionRecord],
    profiles: &BTreeMap<String, &VulnerabilityProfile>,
) -> Vec<String> {
    let mut unknown: Vec<String> = Vec::new();
    for detection in detections {
        let city = normalize_city(&detection.city);
        if !profiles.contains_key(&city) && !unknown.contains(&city) {
            unknown.push(city);
        }
    }
    unknown
}

/// Indexes profiles by normalized city. The first profile wins if a city
/// appears more than once.
fn index_profiles(
    vulnerability: &[VulnerabilityProfile],
) -> BTreeMap<String, &VulnerabilityProfile> {
    let mut index = BTreeMap::new();
    for profile in vulnerability {
        let city = normalize_city(&profile.city);
        if index.contains_key(&city) {
            log::warn!("Duplicate vulnerability profile for '{city}' ignored");
            continue;
        }
        index.insert(city, profile);
    }
    index
}

//! Compile-time registry of supported cities.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a city means adding a TOML file under `cities/` and an entry here.

use heatwave_weather_models::{City, normalize_city};

use crate::FetchError;

/// Number of registered cities. Enforced by a test.
#[cfg(test)]
const EXPECTED_CITY_COUNT: usize = 4;

/// Embedded TOML city definitions.
const CITY_TOMLS: &[(&str, &str)] = &[
    ("athens", include_str!("../cities/athens.toml")),
    ("rome", include_str!("../cities/rome.toml")),
    ("stockholm", include_str!("../cities/stockholm.toml")),
    ("london", include_str!("../cities/london.toml")),
];

/// Returns all registered cities.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. These are compile-time
/// constants, so a failure is a development error caught by the tests.
#[must_use]
pub fn all_cities() -> Vec<City> {
    CITY_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse city definition '{name}': {e}"))
        })
        .collect()
}

/// Looks up a city by identifier or display name, ignoring case and
/// surrounding whitespace.
///
/// # Errors
///
/// Returns [`FetchError::UnknownCity`] if no registered city matches.
pub fn find_city(name: &str) -> Result<City, FetchError> {
    let wanted = normalize_city(name);
    all_cities()
        .into_iter()
        .find(|city| city.id == wanted || normalize_city(&city.name) == wanted)
        .ok_or_else(|| FetchError::UnknownCity(name.trim().to_string()))
}

//! On-disk locations of the pipeline tables.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "HEATWAVE_DATA_DIR";

/// Data directory used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Resolves table paths under a data directory.
///
/// Inputs live in `raw/`, stage outputs in `processed/`. File names are
/// keyed by the normalized city identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a layout rooted at `$HEATWAVE_DATA_DIR`, or `data` when unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()))
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn historical(&self, city: &str) -> PathBuf {
        self.raw(&format!("{city}_historical.csv"))
    }

    #[must_use]
    pub fn forecast(&self, city: &str) -> PathBuf {
        self.raw(&format!("{city}_forecast.csv"))
    }

    /// The shared vulnerability table covering every city.
    #[must_use]
    pub fn vulnerability(&self) -> PathBuf {
        self.raw("urban_vulnerability.csv")
    }

    #[must_use]
    pub fn climatology(&self, city: &str) -> PathBuf {
        self.processed(&format!("{city}_climatology_95p.csv"))
    }

    #[must_use]
    pub fn detections(&self, city: &str) -> PathBuf {
        self.processed(&format!("{city}_forecast_with_heatwaves.csv"))
    }

    #[must_use]
    pub fn risk(&self, city: &str) -> PathBuf {
        self.processed(&format!("{city}_heatwave_risk.csv"))
    }

    fn raw(&self, file: &str) -> PathBuf {
        self.root.join("raw").join(file)
    }

    fn processed(&self, file: &str) -> PathBuf {
        self.root.join("processed").join(file)
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

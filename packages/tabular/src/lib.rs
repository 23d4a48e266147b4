#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flat-file tables for the heatwave pipeline.
//!
//! Every stage's input and output is a comma-delimited file with a header
//! row. Readers validate that the required columns are present, ignore any
//! extra columns, and reject malformed cells with the offending row and
//! column instead of coercing them. Writers always emit a header, even for
//! an empty table.

pub mod layout;
pub mod parsing;
pub mod read;
pub mod write;

use strum_macros::{AsRefStr, Display};

pub use layout::DataLayout;
pub use read::{
    read_climatology, read_daily_temperatures, read_detections, read_vulnerability,
};
pub use write::{TableRow, write_table, write_table_file};

/// The kinds of table the pipeline reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TableKind {
    /// Multi-decade daily history (`date, tmin, tmax, city`).
    Historical,
    /// Short-range daily forecast (`date, tmin, tmax, city`).
    Forecast,
    /// Day-of-year thresholds (`day_of_year, tmin_95p, tmax_95p`).
    Climatology,
    /// Forecast with exceedance flags and heatwave ids.
    Detection,
    /// Per-city vulnerability attributes.
    Vulnerability,
    /// Scored forecast.
    Risk,
}

/// Errors that can occur while reading or writing tables.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// File could not be opened, created, or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path of the file involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV stream itself was malformed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// One or more required columns are absent from the header row.
    #[error("{table} table is missing required column(s): {}", .columns.join(", "))]
    MissingColumns {
        /// Table being read.
        table: TableKind,
        /// Names of the absent columns.
        columns: Vec<String>,
    },

    /// A cell could not be parsed.
    #[error("{table} table, line {line}, column '{column}': {reason} (got '{value}')")]
    DataFormat {
        /// Table being read.
        table: TableKind,
        /// 1-based line number in the file (the header is line 1).
        line: u64,
        /// Column name.
        column: String,
        /// Raw cell contents.
        value: String,
        /// What was expected.
        reason: &'static str,
    },

    /// A detection table carries neither `exceeds_95p` nor its `is_hot`
    /// alias, so heatwave detection has not been run on it.
    #[error("detection table has neither 'exceeds_95p' nor 'is_hot'; run heatwave detection first")]
    PrecursorMissing,
}

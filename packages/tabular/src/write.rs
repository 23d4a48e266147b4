//! Table writers.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use heatwave_weather_models::{
    ClimatologyEntry, DailyTemperatureRecord, DetectionRecord, RiskRecord, VulnerabilityProfile,
};
use serde::Serialize;

use crate::{TableError, TableKind};

/// A row type with a fixed column layout.
///
/// `COLUMNS` must list the serialized fields in declaration order. The
/// header is written from it so empty tables still carry their schema.
pub trait TableRow: Serialize {
    /// Table this row belongs to.
    const KIND: TableKind;
    /// Header names in serialization order.
    const COLUMNS: &'static [&'static str];
}

impl TableRow for DailyTemperatureRecord {
    const KIND: TableKind = TableKind::Forecast;
    const COLUMNS: &'static [&'static str] = &["date", "tmin", "tmax", "city"];
}

impl TableRow for ClimatologyEntry {
    const KIND: TableKind = TableKind::Climatology;
    const COLUMNS: &'static [&'static str] = &["day_of_year", "tmin_95p", "tmax_95p"];
}

impl TableRow for DetectionRecord {
    const KIND: TableKind = TableKind::Detection;
    const COLUMNS: &'static [&'static str] =
        &["date", "tmin", "tmax", "city", "exceeds_95p", "heatwave_id"];
}

impl TableRow for VulnerabilityProfile {
    const KIND: TableKind = TableKind::Vulnerability;
    const COLUMNS: &'static [&'static str] = &[
        "city",
        "elderly_percent",
        "density_per_km2",
        "green_cover_percent",
    ];
}

impl TableRow for RiskRecord {
    const KIND: TableKind = TableKind::Risk;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "tmin",
        "tmax",
        "city",
        "exceeds_95p",
        "heatwave_id",
        "elderly_percent",
        "density_per_km2",
        "green_cover_percent",
        "risk_level",
        "high_vulnerability",
    ];
}

/// Writes `rows` with a header line to `writer`.
///
/// # Errors
///
/// Returns [`TableError::Csv`] if a row cannot be serialized or written.
pub fn write_table<W: Write, T: TableRow>(writer: W, rows: &[T]) -> Result<(), TableError> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv.write_record(T::COLUMNS)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush().map_err(csv::Error::from)?;

    Ok(())
}

/// Writes `rows` to the file at `path`, creating parent directories and
/// replacing any existing file.
///
/// # Errors
///
/// Returns [`TableError::Io`] if the directory or file cannot be created,
/// or [`TableError::Csv`] if writing fails.
pub fn write_table_file<T: TableRow>(path: &Path, rows: &[T]) -> Result<(), TableError> {
    let io_error = |source| TableError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = File::create(path).map_err(io_error)?;
    write_table(file, rows)?;

    log::info!(
        "Wrote {} {} row(s) to {}",
        rows.len(),
        T::KIND,
        path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use heatwave_weather_models::RiskLevel;

    use super::*;
    use crate::read::{read_climatology, read_daily_temperatures, read_detections};

    fn render<T: TableRow>(rows: &[T]) -> String {
        let mut buffer = Vec::new();
        write_table(&mut buffer, rows).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn empty_table_keeps_its_header() {
        let rows: Vec<DetectionRecord> = Vec::new();
        assert_eq!(
            render(&rows),
            "date,tmin,tmax,city,exceeds_95p,heatwave_id\n"
        );
    }

    #[test]
    fn detection_rows_leave_missing_ids_empty() {
        let rows = vec![
            DetectionRecord {
                date: date(1),
                tmin: 25.0,
                tmax: 38.5,
                city: "athens".to_string(),
                exceeds_95p: true,
                heatwave_id: Some(1),
            },
            DetectionRecord {
                date: date(2),
                tmin: 20.0,
                tmax: 30.0,
                city: "athens".to_string(),
                exceeds_95p: false,
                heatwave_id: None,
            },
        ];
        let text = render(&rows);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "2024-07-01,25.0,38.5,athens,true,1");
        assert_eq!(lines[2], "2024-07-02,20.0,30.0,athens,false,");
        assert_eq!(read_detections(text.as_bytes()).unwrap(), rows);
    }

    #[test]
    fn risk_rows_write_level_names() {
        let row = RiskRecord {
            date: date(3),
            tmin: 26.0,
            tmax: 39.0,
            city: "rome".to_string(),
            exceeds_95p: true,
            heatwave_id: Some(2),
            elderly_percent: None,
            density_per_km2: None,
            green_cover_percent: None,
            risk_level: RiskLevel::Extreme,
            high_vulnerability: false,
        };
        let text = render(&[row]);
        assert_eq!(
            text.lines().nth(1),
            Some("2024-07-03,26.0,39.0,rome,true,2,,,,Extreme,false")
        );
    }

    #[test]
    fn climatology_reads_back_after_write() {
        let entries = vec![ClimatologyEntry {
            day_of_year: 200,
            tmin_95p: 23.17,
            tmax_95p: 35.02,
        }];
        let text = render(&entries);
        assert_eq!(read_climatology(text.as_bytes()).unwrap(), entries);
    }

    #[test]
    fn writes_file_and_creates_directories() {
        let dir = std::env::temp_dir().join(format!(
            "heatwave_tabular_write_{}",
            std::process::id()
        ));
        let path = dir.join("raw").join("rome_forecast.csv");
        let rows = vec![DailyTemperatureRecord::new(date(4), 21.0, 33.0, "Rome")];

        write_table_file(&path, &rows).unwrap();
        let file = crate::read::open(&path).unwrap();
        let read_back = read_daily_temperatures(file, TableKind::Forecast, "rome").unwrap();

        assert_eq!(read_back, rows);
        fs::remove_dir_all(&dir).unwrap();
    }
}

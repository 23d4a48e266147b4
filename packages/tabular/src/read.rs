//! Table readers.
//!
//! Readers are generic over [`std::io::Read`] so they work on files and
//! in-memory buffers alike; [`open`] wraps file opening with the path in the
//! error.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use heatwave_weather_models::{
    ClimatologyEntry, DailyTemperatureRecord, DetectionRecord, VulnerabilityProfile,
    normalize_city,
};

use crate::parsing::{
    parse_bool, parse_date, parse_number, parse_optional_whole, parse_whole,
};
use crate::{TableError, TableKind};

/// Alias accepted in place of `exceeds_95p` in detection tables.
pub const IS_HOT_ALIAS: &str = "is_hot";

/// Opens `path` for reading.
///
/// # Errors
///
/// Returns [`TableError::Io`] if the file cannot be opened.
pub fn open(path: &Path) -> Result<File, TableError> {
    File::open(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Reads a `date, tmin, tmax[, city]` table (historical or forecast).
///
/// When the `city` column is absent every row is labelled with
/// `fallback_city`. City names are normalized. Rows where `tmin > tmax` are
/// kept but counted in a warning.
///
/// # Errors
///
/// Returns [`TableError::MissingColumns`] if `date`, `tmin`, or `tmax` is
/// absent, and [`TableError::DataFormat`] for malformed dates or
/// non-numeric temperatures.
pub fn read_daily_temperatures<R: Read>(
    reader: R,
    table: TableKind,
    fallback_city: &str,
) -> Result<Vec<DailyTemperatureRecord>, TableError> {
    let mut csv = reader_builder().from_reader(reader);
    let columns = Columns::from_headers(table, csv.headers()?);
    columns.require(&["date", "tmin", "tmax"])?;
    let has_city = columns.contains("city");

    let mut records = Vec::new();
    let mut inverted = 0usize;

    for (i, result) in csv.records().enumerate() {
        let record = result?;
        let row = columns.row(&record, i);

        let city = if has_city {
            row.cell("city")
        } else {
            fallback_city
        };
        let temperature = DailyTemperatureRecord::new(
            row.parse("date", parse_date)?,
            row.parse("tmin", parse_number)?,
            row.parse("tmax", parse_number)?,
            city,
        );
        if temperature.tmin > temperature.tmax {
            inverted += 1;
        }
        records.push(temperature);
    }

    if inverted > 0 {
        log::warn!("{table} table: {inverted} row(s) have tmin above tmax");
    }
    log::debug!("Read {} {table} row(s)", records.len());

    Ok(records)
}

/// Reads a `day_of_year, tmin_95p, tmax_95p` table.
///
/// # Errors
///
/// Returns [`TableError::MissingColumns`] or [`TableError::DataFormat`] on
/// schema or cell problems.
pub fn read_climatology<R: Read>(reader: R) -> Result<Vec<ClimatologyEntry>, TableError> {
    let table = TableKind::Climatology;
    let mut csv = reader_builder().from_reader(reader);
    let columns = Columns::from_headers(table, csv.headers()?);
    columns.require(&["day_of_year", "tmin_95p", "tmax_95p"])?;

    let mut entries = Vec::new();
    for (i, result) in csv.records().enumerate() {
        let record = result?;
        let row = columns.row(&record, i);
        entries.push(ClimatologyEntry {
            day_of_year: row.parse("day_of_year", parse_whole)?,
            tmin_95p: row.parse("tmin_95p", parse_number)?,
            tmax_95p: row.parse("tmax_95p", parse_number)?,
        });
    }

    Ok(entries)
}

/// Reads a detection table.
///
/// The exceedance flag is read from `exceeds_95p`, or from `is_hot` when
/// only the alias is present. A missing `heatwave_id` column means no row
/// belongs to a heatwave.
///
/// # Errors
///
/// Returns [`TableError::MissingColumns`] if `date`, `tmin`, `tmax`, or
/// `city` is absent, [`TableError::PrecursorMissing`] if neither flag
/// column exists, and [`TableError::DataFormat`] for malformed cells.
pub fn read_detections<R: Read>(reader: R) -> Result<Vec<DetectionRecord>, TableError> {
    let table = TableKind::Detection;
    let mut csv = reader_builder().from_reader(reader);
    let columns = Columns::from_headers(table, csv.headers()?);
    columns.require(&["date", "tmin", "tmax", "city"])?;

    let flag_column = if columns.contains("exceeds_95p") {
        "exceeds_95p"
    } else if columns.contains(IS_HOT_ALIAS) {
        log::debug!("Using '{IS_HOT_ALIAS}' as the exceedance flag");
        IS_HOT_ALIAS
    } else {
        return Err(TableError::PrecursorMissing);
    };
    let has_id = columns.contains("heatwave_id");

    let mut detections = Vec::new();
    for (i, result) in csv.records().enumerate() {
        let record = result?;
        let row = columns.row(&record, i);
        detections.push(DetectionRecord {
            date: row.parse("date", parse_date)?,
            tmin: row.parse("tmin", parse_number)?,
            tmax: row.parse("tmax", parse_number)?,
            city: normalize_city(row.cell("city")),
            exceeds_95p: row.parse(flag_column, parse_bool)?,
            heatwave_id: if has_id {
                row.parse("heatwave_id", parse_optional_whole)?
            } else {
                None
            },
        });
    }

    Ok(detections)
}

/// Reads a `city, elderly_percent, density_per_km2, green_cover_percent`
/// table. City names are normalized.
///
/// # Errors
///
/// Returns [`TableError::MissingColumns`] or [`TableError::DataFormat`] on
/// schema or cell problems.
pub fn read_vulnerability<R: Read>(reader: R) -> Result<Vec<VulnerabilityProfile>, TableError> {
    let table = TableKind::Vulnerability;
    let mut csv = reader_builder().from_reader(reader);
    let columns = Columns::from_headers(table, csv.headers()?);
    columns.require(&[
        "city",
        "elderly_percent",
        "density_per_km2",
        "green_cover_percent",
    ])?;

    let mut profiles = Vec::new();
    for (i, result) in csv.records().enumerate() {
        let record = result?;
        let row = columns.row(&record, i);
        profiles.push(VulnerabilityProfile {
            city: normalize_city(row.cell("city")),
            elderly_percent: row.parse("elderly_percent", parse_number)?,
            density_per_km2: row.parse("density_per_km2", parse_number)?,
            green_cover_percent: row.parse("green_cover_percent", parse_number)?,
        });
    }

    Ok(profiles)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true).trim(csv::Trim::All);
    builder
}

/// Header name to column position lookup for one table.
struct Columns {
    table: TableKind,
    positions: BTreeMap<String, usize>,
}

impl Columns {
    fn from_headers(table: TableKind, headers: &csv::StringRecord) -> Self {
        let mut positions = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            positions.entry(header.trim().to_owned()).or_insert(i);
        }
        Self { table, positions }
    }

    fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    fn require(&self, required: &[&str]) -> Result<(), TableError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|column| !self.contains(column))
            .map(|column| (*column).to_owned())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TableError::MissingColumns {
                table: self.table,
                columns: missing,
            })
        }
    }

    fn row<'a>(&'a self, record: &'a csv::StringRecord, index: usize) -> Row<'a> {
        // Data rows start on line 2, after the header.
        let line = record
            .position()
            .map_or(index as u64 + 2, csv::Position::line);
        Row {
            columns: self,
            record,
            line,
        }
    }
}

/// One data row with its position for error reporting.
struct Row<'a> {
    columns: &'a Columns,
    record: &'a csv::StringRecord,
    line: u64,
}

impl Row<'_> {
    fn cell(&self, column: &str) -> &str {
        self.columns
            .positions
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }

    fn parse<T>(
        &self,
        column: &str,
        parser: fn(&str) -> Result<T, &'static str>,
    ) -> Result<T, TableError> {
        let value = self.cell(column);
        parser(value).map_err(|reason| TableError::DataFormat {
            table: self.columns.table,
            line: self.line,
            column: column.to_owned(),
            value: value.to_owned(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use heatwave_weather_models::LEAP_DAY_OF_YEAR;

    use super::*;

    #[test]
    fn reads_forecast_and_normalizes_city() {
        let csv = "date,tmin,tmax,city\n2024-07-01,22.5,34.1, Athens \n2024-07-02,23,35.0,athens\n";
        let records =
            read_daily_temperatures(csv.as_bytes(), TableKind::Forecast, "athens").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].city, "athens");
        assert!((records[1].tmin - 23.0).abs() < f64::EPSILON);
    }

    #[test]
    fn city_column_is_optional() {
        let csv = "date,tmin,tmax\n2020-12-31,1.0,4.0\n";
        let records =
            read_daily_temperatures(csv.as_bytes(), TableKind::Historical, "Stockholm").unwrap();
        assert_eq!(records[0].city, "stockholm");
        assert_eq!(records[0].day_of_year(), LEAP_DAY_OF_YEAR);
    }

    #[test]
    fn accepts_extra_columns_in_any_order() {
        let csv = "city,note,tmax,date,tmin\nrome,x,30.5,2024-06-01,18.0\n";
        let records = read_daily_temperatures(csv.as_bytes(), TableKind::Forecast, "").unwrap();
        assert!((records[0].tmax - 30.5).abs() < f64::EPSILON);
    }

    #[test]
    fn reports_every_missing_column() {
        let csv = "date,city\n2024-07-01,rome\n";
        let err = read_daily_temperatures(csv.as_bytes(), TableKind::Forecast, "rome").unwrap_err();
        match err {
            TableError::MissingColumns { table, columns } => {
                assert_eq!(table, TableKind::Forecast);
                assert_eq!(columns, vec!["tmin".to_string(), "tmax".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_numeric_temperature_with_line() {
        let csv = "date,tmin,tmax,city\n2024-07-01,20,30,rome\n2024-07-02,hot,31,rome\n";
        let err = read_daily_temperatures(csv.as_bytes(), TableKind::Forecast, "rome").unwrap_err();
        match err {
            TableError::DataFormat {
                line, column, value, ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, "tmin");
                assert_eq!(value, "hot");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_malformed_date() {
        let csv = "date,tmin,tmax,city\n07/01/2024,20,30,rome\n";
        let err = read_daily_temperatures(csv.as_bytes(), TableKind::Forecast, "rome").unwrap_err();
        assert!(matches!(err, TableError::DataFormat { ref column, .. } if column == "date"));
    }

    #[test]
    fn reads_climatology() {
        let csv = "day_of_year,tmin_95p,tmax_95p\n1,10.25,15.5\n200,24.1,36.82\n";
        let entries = read_climatology(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].day_of_year, 200);
        assert!((entries[1].tmax_95p - 36.82).abs() < f64::EPSILON);
    }

    #[test]
    fn reads_pandas_style_detection_table() {
        let csv = "date,tmin,tmax,city,tmin_95p,tmax_95p,exceeds_95p,heatwave_id\n\
                   2024-07-01,25,38,athens,24,36,True,2.0\n\
                   2024-07-02,20,30,athens,24,36,False,\n";
        let detections = read_detections(csv.as_bytes()).unwrap();
        assert!(detections[0].exceeds_95p);
        assert_eq!(detections[0].heatwave_id, Some(2));
        assert!(!detections[1].exceeds_95p);
        assert_eq!(detections[1].heatwave_id, None);
    }

    #[test]
    fn is_hot_stands_in_for_exceeds_95p() {
        let csv = "date,tmin,tmax,city,is_hot\n2024-07-01,25,38,athens,true\n";
        let detections = read_detections(csv.as_bytes()).unwrap();
        assert!(detections[0].exceeds_95p);
        assert_eq!(detections[0].heatwave_id, None);
    }

    #[test]
    fn detection_without_flag_is_a_missing_precursor() {
        let csv = "date,tmin,tmax,city\n2024-07-01,25,38,athens\n";
        assert!(matches!(
            read_detections(csv.as_bytes()),
            Err(TableError::PrecursorMissing)
        ));
    }

    #[test]
    fn reads_vulnerability() {
        let csv = "city,elderly_percent,density_per_km2,green_cover_percent\nAthens,22.4,17000,15\n";
        let profiles = read_vulnerability(csv.as_bytes()).unwrap();
        assert_eq!(profiles[0].city, "athens");
        assert!((profiles[0].density_per_km2 - 17000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn header_only_table_is_empty() {
        let csv = "day_of_year,tmin_95p,tmax_95p\n";
        assert!(read_climatology(csv.as_bytes()).unwrap().is_empty());
    }
}

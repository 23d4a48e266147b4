//! Strict field parsers for table cells.
//!
//! Each parser returns a short reason on failure; the caller attaches the
//! table, row, and column before surfacing it as
//! [`TableError::DataFormat`](crate::TableError::DataFormat). Nothing is
//! silently coerced.

use chrono::NaiveDate;

/// Parses a calendar date in `YYYY-MM-DD` form. A trailing time part
/// (`2024-07-01 00:00:00`, `2024-07-01T00:00`) is ignored.
///
/// # Errors
///
/// Returns a reason if the value is empty or not a valid date.
pub fn parse_date(value: &str) -> Result<NaiveDate, &'static str> {
    let date_part = value.split([' ', 'T']).next().unwrap_or_default();
    if date_part.is_empty() {
        return Err("missing date");
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| "expected a YYYY-MM-DD date")
}

/// Parses a finite floating point number.
///
/// # Errors
///
/// Returns a reason if the value is empty, not numeric, or not finite.
pub fn parse_number(value: &str) -> Result<f64, &'static str> {
    if value.is_empty() {
        return Err("missing value");
    }
    let number = value.parse::<f64>().map_err(|_| "expected a number")?;
    if !number.is_finite() {
        return Err("expected a finite number");
    }
    Ok(number)
}

/// Parses a boolean written as `true`/`false` in any case, or `1`/`0`.
///
/// # Errors
///
/// Returns a reason for any other value.
pub fn parse_bool(value: &str) -> Result<bool, &'static str> {
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Ok(false)
    } else {
        Err("expected true or false")
    }
}

/// Parses a non-negative integer day of year or group id.
///
/// Integral floats such as `3.0` are accepted because nullable integer
/// columns are often written as floats.
///
/// # Errors
///
/// Returns a reason if the value is not a non-negative whole number.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_whole(value: &str) -> Result<u32, &'static str> {
    if value.is_empty() {
        return Err("missing value");
    }
    if let Ok(whole) = value.parse::<u32>() {
        return Ok(whole);
    }
    let number = parse_number(value).map_err(|_| "expected a whole number")?;
    if number.fract() != 0.0 || number < 0.0 || number > f64::from(u32::MAX) {
        return Err("expected a whole number");
    }
    Ok(number as u32)
}

/// Parses an optional whole number. Empty and `NaN` cells are `None`.
///
/// # Errors
///
/// Returns a reason if a non-empty value is not a whole number.
pub fn parse_optional_whole(value: &str) -> Result<Option<u32>, &'static str> {
    if is_null(value) {
        return Ok(None);
    }
    parse_whole(value).map(Some)
}

fn is_null(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_date() {
        let date = parse_date("2024-07-15").unwrap();
        assert_eq!(date.to_string(), "2024-07-15");
    }

    #[test]
    fn ignores_time_suffix() {
        assert_eq!(
            parse_date("2024-07-15 00:00:00").unwrap(),
            parse_date("2024-07-15T00:00").unwrap()
        );
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date("").is_err());
        assert!(parse_date("15/07/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn parses_numbers_strictly() {
        assert!((parse_number("-3.25").unwrap() - -3.25).abs() < f64::EPSILON);
        assert!(parse_number("").is_err());
        assert!(parse_number("warm").is_err());
        assert!(parse_number("NaN").is_err());
        assert!(parse_number("inf").is_err());
    }

    #[test]
    fn parses_booleans_in_any_case() {
        assert!(parse_bool("True").unwrap());
        assert!(parse_bool("true").unwrap());
        assert!(!parse_bool("FALSE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn parses_whole_numbers_written_as_floats() {
        assert_eq!(parse_whole("7").unwrap(), 7);
        assert_eq!(parse_whole("7.0").unwrap(), 7);
        assert!(parse_whole("7.5").is_err());
        assert!(parse_whole("-1").is_err());
        assert_eq!(parse_optional_whole("").unwrap(), None);
        assert_eq!(parse_optional_whole("NaN").unwrap(), None);
    }
}

//! Date parsing for `@` operands and date-valued fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats tried, in order, for date-times without an offset.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a date or date-time.
///
/// Accepts `YYYY-MM-DD` (midnight), naive date-times with `T` or a space
/// separator, and RFC 3339 timestamps, which are converted to UTC and
/// compared without their offset.
pub fn parse(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_only_is_midnight() {
        let dt = parse("2017-01-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2017, 1, 1));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (0, 0, 0));
    }

    #[test]
    fn test_parse_naive_datetime() {
        let dt = parse("2017-06-15T10:30:00").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (10, 30));

        let dt = parse("2017-06-15 08:05").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (8, 5));
    }

    #[test]
    fn test_parse_rfc3339_converts_to_utc() {
        let dt = parse("2017-06-15T10:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("").is_none());
        assert!(parse("   ").is_none());
        assert!(parse("yesterday").is_none());
        assert!(parse("2017-13-01").is_none());
        assert!(parse("2017-02-30").is_none());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(parse(" 2017-01-01 "), parse("2017-01-01"));
    }
}

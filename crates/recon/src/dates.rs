//! Day-month-year parsing shared by the normalizer and the AI resolver.
//!
//! Source exports write dates as `DD-MM-YYYY`; a few sheets use `/` instead
//! of `-`, and spreadsheet exports sometimes append a midnight time.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y"];
const DATE_TIME_FORMATS: &[&str] = &["%d-%m-%Y %H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// Parse a day-month-year date. A trailing `HH:MM:SS` is accepted and dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if !has_four_digit_year(value) {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| parse_date_time(value).map(|dt| dt.date()))
}

/// Parse a day-month-year date followed by `HH:MM:SS`.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if !has_four_digit_year(value) {
        return None;
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// `%Y` takes any digit count, so `05-03-24` would otherwise parse as year 24.
fn has_four_digit_year(value: &str) -> bool {
    let date = value.split_whitespace().next().unwrap_or("");
    date.split(['-', '/'])
        .nth(2)
        .is_some_and(|year| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()))
}

/// Combine a date column and a time column into one timestamp.
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = parse_date(date)?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S").ok()?;
    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_month_year() {
        assert_eq!(parse_date("05-03-2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("05/03/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date(" 31-12-2023 "), Some(ymd(2023, 12, 31)));
    }

    #[test]
    fn trailing_time_is_dropped() {
        assert_eq!(parse_date("05-03-2024 00:00:00"), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn rejects_other_conventions() {
        assert_eq!(parse_date("2024-03-05"), None);
        assert_eq!(parse_date("13-13-2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn year_must_have_four_digits() {
        assert_eq!(parse_date("05-03-24"), None);
        assert_eq!(parse_date("05-03-202"), None);
        assert_eq!(parse_date("05/03/20245"), None);
        assert_eq!(parse_date("05-03-24 00:00:00"), None);
        assert!(parse_date_time("05-03-24 10:00:00").is_none());
        assert!(parse_timestamp("05-03-24", "10:00:00").is_none());
    }

    #[test]
    fn timestamp_from_two_columns() {
        let ts = parse_timestamp("05-03-2024", "14:30:05").unwrap();
        assert_eq!(ts.to_string(), "2024-03-05 14:30:05");
        assert!(parse_timestamp("05-03-2024", "2pm").is_none());
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Rendering used for the time of day once the date is dropped.
pub const TIME_FORMAT: &str = "%H:%M:%S";

// Form exports use a handful of shapes depending on the locale of the sheet.
const DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %I:%M:%S %p",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// Shapes carrying a numeric offset such as `+0500` or `-04:00`.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y/%m/%d %I:%M:%S %p %z",
    "%m/%d/%Y %H:%M:%S %z",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parses a full timestamp and keeps only its time of day.
///
/// The custom format, if any, is tried first. A trailing zone token such as
/// `GMT-4` or `EST` is ignored: the wall-clock time is kept as written.
pub(crate) fn parse_time_of_day(value: &str, custom_format: Option<&str>) -> Option<NaiveTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(fmt) = custom_format {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.time());
        }
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_local().time());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local().time());
    }
    parse_naive(value)
        .or_else(|| parse_zoned(value))
        .or_else(|| strip_zone(value).and_then(parse_naive))
}

fn parse_zoned(value: &str) -> Option<NaiveTime> {
    ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.naive_local().time())
}

fn parse_naive(value: &str) -> Option<NaiveTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.time())
        .or_else(|| {
            // A bare date stands for midnight.
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.time())
        })
}

fn strip_zone(value: &str) -> Option<&str> {
    let (head, last) = value.rsplit_once(' ')?;
    let is_meridiem = last.eq_ignore_ascii_case("am") || last.eq_ignore_ascii_case("pm");
    if !is_meridiem && last.starts_with(|c: char| c.is_ascii_alphabetic()) {
        Some(head.trim_end())
    } else {
        None
    }
}

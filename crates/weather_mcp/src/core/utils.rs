use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::{OffsetComponents, Tz};

use crate::core::error::{WeatherServerError, WeatherServerResult};

// Constants for format strings
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DAY_FORMAT: &str = "%A";
pub const PROVIDER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Naive datetime layouts accepted from callers, tried in order
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Time-of-day layouts accepted from callers, tried in order
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Available resource URIs for the Weather MCP Server
pub const AVAILABLE_RESOURCES: &[&str] = &["weather://status", "weather://help"];

/// Parse a `YYYY-MM-DD` calendar date supplied as a tool argument
pub fn parse_date(field: &str, value: &str) -> WeatherServerResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        WeatherServerError::invalid_argument(format!(
            "{field} must be a calendar date in YYYY-MM-DD format, got '{value}'"
        ))
    })
}

/// Parse a naive datetime in any of the accepted layouts
pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Parse a bare time of day in any of the accepted layouts
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

/// Format a time difference in hours
///
/// # Arguments
///
/// * `hours_difference` - The time difference in hours
///
/// # Returns
///
/// A formatted string representing the time difference
pub fn format_time_difference(hours_difference: f64) -> String {
    match hours_difference.fract() {
        0.0 => format!("{:+.0}h", hours_difference),
        _ => {
            let formatted = format!("{:+}", hours_difference);
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            format!("{}h", trimmed)
        }
    }
}

/// Total UTC offset in seconds, DST included
pub fn total_offset_seconds(dt: &DateTime<Tz>) -> i64 {
    (dt.offset().base_utc_offset() + dt.offset().dst_offset()).num_seconds()
}

/// Calculate the offset difference between the zones of two datetimes
pub fn calculate_time_difference(source_time: &DateTime<Tz>, target_time: &DateTime<Tz>) -> String {
    let seconds = total_offset_seconds(target_time) - total_offset_seconds(source_time);
    format_time_difference(seconds as f64 / 3600.0)
}

/// Render an offset in seconds as `+HH:MM`
pub fn format_utc_offset(seconds: i64) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

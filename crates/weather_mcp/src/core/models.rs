use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::OffsetComponents;
use derive_getters::Getters;
use rmcp::schemars;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{
    error::{WeatherServerError, WeatherServerResult},
    utils::{DATETIME_FORMAT, DAY_FORMAT},
};

/// Helper function to deserialize and trim strings
fn deserialize_trimmed_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.trim().to_string())
}

/// Trims optional strings, treating blank input as absent
fn deserialize_trimmed_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// Argument-level checks that go beyond what deserialization enforces
pub trait Validate {
    fn validate(&self) -> WeatherServerResult<()>;
}

fn require_non_empty(field: &str, value: &str) -> WeatherServerResult<()> {
    if value.is_empty() {
        return Err(WeatherServerError::invalid_argument(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

/// Request for the current weather in a city
#[derive(Debug, Deserialize, schemars::JsonSchema, Getters)]
pub struct CurrentWeatherRequest {
    /// City or place name (e.g., 'New York', 'Paris, France')
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    city: String,
}

impl Validate for CurrentWeatherRequest {
    fn validate(&self) -> WeatherServerResult<()> {
        require_non_empty("city", &self.city)
    }
}

/// Request for hourly weather across a date range
#[derive(Debug, Deserialize, schemars::JsonSchema, Getters)]
pub struct WeatherRangeRequest {
    /// City or place name
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    city: String,
    /// First day of the range in YYYY-MM-DD format
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    start_date: String,
    /// Last day of the range (inclusive) in YYYY-MM-DD format
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    end_date: String,
}

impl Validate for WeatherRangeRequest {
    fn validate(&self) -> WeatherServerResult<()> {
        require_non_empty("city", &self.city)?;
        require_non_empty("start_date", &self.start_date)?;
        require_non_empty("end_date", &self.end_date)
    }
}

/// Request for the detailed reading closest to a point in time
#[derive(Debug, Deserialize, schemars::JsonSchema, Getters)]
pub struct WeatherDetailsRequest {
    /// City or place name
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    city: String,
    /// Local time at the location (YYYY-MM-DDTHH:MM, or YYYY-MM-DD for midday). Defaults to now
    #[serde(default, deserialize_with = "deserialize_trimmed_option")]
    datetime: Option<String>,
}

impl Validate for WeatherDetailsRequest {
    fn validate(&self) -> WeatherServerResult<()> {
        require_non_empty("city", &self.city)
    }
}

/// Request for the current date and time
#[derive(Debug, Deserialize, schemars::JsonSchema, Getters)]
pub struct CurrentDateTimeRequest {
    /// IANA timezone name (e.g., 'Asia/Tokyo'). Defaults to the server's local timezone
    #[serde(default, deserialize_with = "deserialize_trimmed_option")]
    timezone: Option<String>,
}

/// Request for timezone metadata
#[derive(Debug, Deserialize, schemars::JsonSchema, Getters)]
pub struct TimeZoneInfoRequest {
    /// IANA timezone name (e.g., 'Europe/London')
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    timezone: String,
}

impl Validate for TimeZoneInfoRequest {
    fn validate(&self) -> WeatherServerResult<()> {
        require_non_empty("timezone", &self.timezone)
    }
}

/// Request to convert a time between timezones
#[derive(Debug, Deserialize, schemars::JsonSchema, Getters)]
pub struct ConvertTimeRequest {
    /// Time to convert: HH:MM, YYYY-MM-DDTHH:MM[:SS] or an RFC 3339 timestamp
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    time: String,
    /// Source IANA timezone name
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    from_timezone: String,
    /// Target IANA timezone name
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    to_timezone: String,
}

impl Validate for ConvertTimeRequest {
    fn validate(&self) -> WeatherServerResult<()> {
        require_non_empty("time", &self.time)?;
        require_non_empty("from_timezone", &self.from_timezone)?;
        require_non_empty("to_timezone", &self.to_timezone)
    }
}

/// Geographic position of a resolved place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One hourly sample from the weather provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReading {
    /// Local time at the location
    pub time: NaiveDateTime,
    pub temperature_c: f64,
    pub relative_humidity_percent: f64,
    pub dew_point_c: f64,
    pub weather_code: i64,
    pub weather_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction_degrees: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_gusts_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snowfall_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation_probability_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_hpa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_m: Option<f64>,
}

/// Hourly readings plus the zone the provider reported them in
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
    pub timezone: Option<String>,
    pub utc_offset_seconds: i32,
    pub readings: Vec<WeatherReading>,
}

/// Current conditions for a city
#[derive(Debug, Clone, Serialize)]
pub struct CurrentWeatherResult {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(flatten)]
    pub reading: WeatherReading,
}

/// Every hourly reading between two dates
#[derive(Debug, Clone, Serialize)]
pub struct WeatherRangeResult {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub weather_data: Vec<WeatherReading>,
}

/// The reading nearest to a requested local time
#[derive(Debug, Clone, Serialize)]
pub struct WeatherDetailsResult {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub requested_time: NaiveDateTime,
    #[serde(flatten)]
    pub reading: WeatherReading,
}

/// Time result containing timezone information
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TimeResult {
    /// IANA timezone name
    pub timezone: String,
    /// ISO 8601 datetime string
    pub datetime: String,
    /// Day of the week
    pub day_of_week: String,
    /// Whether daylight saving time is active
    pub is_dst: bool,
}

impl TimeResult {
    /// Create a TimeResult from a timezone-aware datetime
    pub fn from_datetime<Tz>(dt: &DateTime<Tz>, timezone_name: &str) -> TimeResult
    where
        Tz: TimeZone,
        Tz::Offset: OffsetComponents + std::fmt::Display,
    {
        let is_dst = dt.offset().dst_offset().num_seconds() != 0;

        TimeResult {
            timezone: timezone_name.to_string(),
            datetime: dt.format(DATETIME_FORMAT).to_string(),
            day_of_week: dt.format(DAY_FORMAT).to_string(),
            is_dst,
        }
    }
}

/// Time conversion result with source and target information
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TimeConversionResult {
    /// Source time information
    pub source: TimeResult,
    /// Target time information
    pub target: TimeResult,
    /// Offset difference between the zones (e.g., "-5h", "+5.5h")
    pub time_difference: String,
}

/// Offset and daylight saving metadata for a timezone
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TimeZoneInfo {
    /// IANA timezone name
    pub timezone: String,
    /// Current zone abbreviation (e.g., "EST", "CEST")
    pub abbreviation: String,
    /// Current UTC offset as +HH:MM
    pub utc_offset: String,
    /// Current UTC offset in seconds, DST included
    pub utc_offset_seconds: i64,
    /// Standard (non-DST) UTC offset in seconds
    pub standard_offset_seconds: i64,
    /// Extra DST offset currently applied, in seconds
    pub dst_offset_seconds: i64,
    /// Whether daylight saving time is active
    pub is_dst: bool,
    /// Current local time in the zone
    pub current_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_result_serialization() {
        let time_result = TimeResult {
            timezone: "UTC".to_string(),
            datetime: "2024-01-01T12:00:00+00:00".to_string(),
            day_of_week: "Monday".to_string(),
            is_dst: false,
        };

        let json = serde_json::to_string(&time_result).unwrap();
        assert!(json.contains("UTC"));
        assert!(json.contains("Monday"));
    }

    #[test]
    fn test_argument_trimming() {
        let json = r#"{"city": "   New York  "}"#;
        let request: CurrentWeatherRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.city(), "New York");

        let json = r#"{
            "time": "  14:30  ",
            "from_timezone": "  America/New_York  ",
            "to_timezone": "   Europe/London   "
        }"#;
        let request: ConvertTimeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.time(), "14:30");
        assert_eq!(request.from_timezone(), "America/New_York");
        assert_eq!(request.to_timezone(), "Europe/London");
    }

    #[test]
    fn test_optional_arguments_default_to_none() {
        let request: CurrentDateTimeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.timezone().is_none());

        let request: CurrentDateTimeRequest =
            serde_json::from_str(r#"{"timezone": "   "}"#).unwrap();
        assert!(request.timezone().is_none());

        let request: WeatherDetailsRequest = serde_json::from_str(r#"{"city": "Oslo"}"#).unwrap();
        assert!(request.datetime().is_none());
    }

    #[test]
    fn test_blank_city_fails_validation() {
        let request: CurrentWeatherRequest = serde_json::from_str(r#"{"city": "  "}"#).unwrap();
        let err = request.validate().unwrap_err();
        assert!(matches!(err, WeatherServerError::InvalidArgument { .. }));
    }

    #[test]
    fn test_reading_omits_missing_extended_fields() {
        let reading = WeatherReading {
            time: NaiveDateTime::parse_from_str("2024-01-01T12:00", "%Y-%m-%dT%H:%M").unwrap(),
            temperature_c: 20.0,
            relative_humidity_percent: 65.0,
            dew_point_c: 13.0,
            weather_code: 0,
            weather_description: "Clear sky".to_string(),
            apparent_temperature_c: None,
            wind_speed_kmh: Some(15.0),
            wind_direction_degrees: None,
            wind_gusts_kmh: None,
            precipitation_mm: None,
            rain_mm: None,
            snowfall_cm: None,
            precipitation_probability_percent: None,
            pressure_hpa: None,
            cloud_cover_percent: None,
            uv_index: None,
            visibility_m: None,
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["time"], "2024-01-01T12:00:00");
        assert_eq!(json["wind_speed_kmh"], 15.0);
        assert!(json.get("uv_index").is_none());
    }
}

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

use crate::core::{
    error::{WeatherServerError, WeatherServerResult},
    models::{TimeConversionResult, TimeResult, TimeZoneInfo},
    utils::{self, DATETIME_FORMAT},
};

/// Timezone lookups and conversions backed by the IANA database
#[derive(Debug, Clone)]
pub struct TimeProvider {
    local_timezone: Tz,
}

impl TimeProvider {
    pub fn new() -> Self {
        // Try to detect the system's local timezone
        let local_tz = match iana_time_zone::get_timezone() {
            Ok(tz_name) => match tz_name.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    tracing::warn!("Could not parse timezone '{}', defaulting to UTC", tz_name);
                    chrono_tz::UTC
                }
            },
            Err(_) => {
                tracing::warn!("Could not detect system timezone, defaulting to UTC");
                chrono_tz::UTC
            }
        };

        Self::with_local_timezone(local_tz)
    }

    pub fn with_local_timezone(local_timezone: Tz) -> Self {
        Self { local_timezone }
    }

    pub fn local_timezone(&self) -> Tz {
        self.local_timezone
    }

    pub fn parse_timezone(&self, timezone_name: &str) -> WeatherServerResult<Tz> {
        Tz::from_str(timezone_name).map_err(|_| WeatherServerError::UnknownTimezone {
            timezone: timezone_name.to_string(),
        })
    }

    /// Current time in `timezone_name`, or in the local zone when absent
    pub fn now(&self, timezone_name: Option<&str>) -> WeatherServerResult<TimeResult> {
        let (timezone, name) = match timezone_name {
            Some(name) => (self.parse_timezone(name)?, name.to_string()),
            None => (self.local_timezone, self.local_timezone.to_string()),
        };
        let current_time = Utc::now().with_timezone(&timezone);

        Ok(TimeResult::from_datetime(&current_time, &name))
    }

    pub fn zone_info(&self, timezone_name: &str) -> WeatherServerResult<TimeZoneInfo> {
        self.zone_info_at(timezone_name, Utc::now())
    }

    fn zone_info_at(
        &self,
        timezone_name: &str,
        instant: DateTime<Utc>,
    ) -> WeatherServerResult<TimeZoneInfo> {
        let timezone = self.parse_timezone(timezone_name)?;
        let local = instant.with_timezone(&timezone);
        let standard = local.offset().base_utc_offset().num_seconds();
        let dst = local.offset().dst_offset().num_seconds();
        let total = utils::total_offset_seconds(&local);

        Ok(TimeZoneInfo {
            timezone: timezone_name.to_string(),
            abbreviation: local.format("%Z").to_string(),
            utc_offset: utils::format_utc_offset(total),
            utc_offset_seconds: total,
            standard_offset_seconds: standard,
            dst_offset_seconds: dst,
            is_dst: dst != 0,
            current_time: local.format(DATETIME_FORMAT).to_string(),
        })
    }

    pub fn convert(
        &self,
        time_str: &str,
        source_tz: &str,
        target_tz: &str,
    ) -> WeatherServerResult<TimeConversionResult> {
        self.convert_at(time_str, source_tz, target_tz, Utc::now())
    }

    /// Convert using `reference` to supply the date for bare `HH:MM` input
    fn convert_at(
        &self,
        time_str: &str,
        source_tz: &str,
        target_tz: &str,
        reference: DateTime<Utc>,
    ) -> WeatherServerResult<TimeConversionResult> {
        let source_timezone = self.parse_timezone(source_tz)?;
        let target_timezone = self.parse_timezone(target_tz)?;

        let source_time = parse_in_zone(time_str, &source_timezone, reference)?;
        let target_time = source_time.with_timezone(&target_timezone);

        Ok(TimeConversionResult {
            source: TimeResult::from_datetime(&source_time, source_tz),
            target: TimeResult::from_datetime(&target_time, target_tz),
            time_difference: utils::calculate_time_difference(&source_time, &target_time),
        })
    }
}

impl Default for TimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_in_zone(
    time_str: &str,
    zone: &Tz,
    reference: DateTime<Utc>,
) -> WeatherServerResult<DateTime<Tz>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(time_str) {
        return Ok(instant.with_timezone(zone));
    }

    let naive = if let Some(naive) = utils::parse_naive_datetime(time_str) {
        naive
    } else if let Some(time) = utils::parse_time_of_day(time_str) {
        reference.with_timezone(zone).date_naive().and_time(time)
    } else {
        return Err(WeatherServerError::invalid_argument(format!(
            "invalid time '{}', expected HH:MM, YYYY-MM-DDTHH:MM[:SS] or RFC 3339",
            time_str
        )));
    };

    localize(zone, naive, time_str)
}

fn localize(zone: &Tz, naive: NaiveDateTime, time_str: &str) -> WeatherServerResult<DateTime<Tz>> {
    zone.from_local_datetime(&naive).single().ok_or_else(|| {
        WeatherServerError::invalid_argument(format!(
            "time '{}' is ambiguous or does not exist in {} due to a DST transition",
            time_str, zone
        ))
    })
}

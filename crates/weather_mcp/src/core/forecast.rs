use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::core::{
    error::{WeatherServerError, WeatherServerResult},
    geocoding::transport_error,
    models::{Coordinates, HourlyForecast, WeatherReading},
    utils::PROVIDER_TIME_FORMAT,
    weather_codes,
};

const SERVICE: &str = "Weather";

/// Hourly variables requested from the provider
const HOURLY_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "dew_point_2m",
    "weather_code",
    "apparent_temperature",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
    "precipitation",
    "rain",
    "snowfall",
    "precipitation_probability",
    "pressure_msl",
    "cloud_cover",
    "uv_index",
    "visibility",
];

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: Option<HourlyData>,
}

#[derive(Debug, Deserialize)]
struct HourlyData {
    time: Option<Vec<String>>,
    temperature_2m: Option<Vec<Option<f64>>>,
    relative_humidity_2m: Option<Vec<Option<f64>>>,
    dew_point_2m: Option<Vec<Option<f64>>>,
    weather_code: Option<Vec<Option<i64>>>,
    apparent_temperature: Option<Vec<Option<f64>>>,
    wind_speed_10m: Option<Vec<Option<f64>>>,
    wind_direction_10m: Option<Vec<Option<f64>>>,
    wind_gusts_10m: Option<Vec<Option<f64>>>,
    precipitation: Option<Vec<Option<f64>>>,
    rain: Option<Vec<Option<f64>>>,
    snowfall: Option<Vec<Option<f64>>>,
    precipitation_probability: Option<Vec<Option<f64>>>,
    pressure_msl: Option<Vec<Option<f64>>>,
    cloud_cover: Option<Vec<Option<f64>>>,
    uv_index: Option<Vec<Option<f64>>>,
    visibility: Option<Vec<Option<f64>>>,
}

fn required<T>(field: &str, values: Option<Vec<T>>, len: usize) -> WeatherServerResult<Vec<T>> {
    let values = values.ok_or_else(|| {
        WeatherServerError::data_shape(format!("missing hourly field '{}'", field))
    })?;
    check_len(field, values.len(), len)?;
    Ok(values)
}

fn optional(
    field: &str,
    values: Option<Vec<Option<f64>>>,
    len: usize,
) -> WeatherServerResult<Vec<Option<f64>>> {
    match values {
        Some(values) => {
            check_len(field, values.len(), len)?;
            Ok(values)
        }
        None => Ok(vec![None; len]),
    }
}

fn check_len(field: &str, actual: usize, expected: usize) -> WeatherServerResult<()> {
    if actual != expected {
        return Err(WeatherServerError::data_shape(format!(
            "hourly field '{}' has {} values but 'time' has {}",
            field, actual, expected
        )));
    }
    Ok(())
}

impl HourlyData {
    /// Zip the provider's parallel arrays into one reading per index
    ///
    /// Hours where any core variable is `null` are skipped.
    fn into_readings(self) -> WeatherServerResult<Vec<WeatherReading>> {
        let times = self
            .time
            .ok_or_else(|| WeatherServerError::data_shape("missing hourly field 'time'"))?;
        let len = times.len();

        let temperature = required("temperature_2m", self.temperature_2m, len)?;
        let humidity = required("relative_humidity_2m", self.relative_humidity_2m, len)?;
        let dew_point = required("dew_point_2m", self.dew_point_2m, len)?;
        let codes = required("weather_code", self.weather_code, len)?;

        let apparent = optional("apparent_temperature", self.apparent_temperature, len)?;
        let wind_speed = optional("wind_speed_10m", self.wind_speed_10m, len)?;
        let wind_direction = optional("wind_direction_10m", self.wind_direction_10m, len)?;
        let wind_gusts = optional("wind_gusts_10m", self.wind_gusts_10m, len)?;
        let precipitation = optional("precipitation", self.precipitation, len)?;
        let rain = optional("rain", self.rain, len)?;
        let snowfall = optional("snowfall", self.snowfall, len)?;
        let probability = optional(
            "precipitation_probability",
            self.precipitation_probability,
            len,
        )?;
        let pressure = optional("pressure_msl", self.pressure_msl, len)?;
        let cloud_cover = optional("cloud_cover", self.cloud_cover, len)?;
        let uv_index = optional("uv_index", self.uv_index, len)?;
        let visibility = optional("visibility", self.visibility, len)?;

        let mut readings = Vec::with_capacity(len);
        for (i, raw_time) in times.iter().enumerate() {
            let time =
                NaiveDateTime::parse_from_str(raw_time, PROVIDER_TIME_FORMAT).map_err(|_| {
                    WeatherServerError::data_shape(format!("unparseable timestamp '{}'", raw_time))
                })?;

            let (Some(temperature_c), Some(humidity_percent), Some(dew_point_c), Some(code)) =
                (temperature[i], humidity[i], dew_point[i], codes[i])
            else {
                tracing::debug!("Skipping hour {} with missing core values", raw_time);
                continue;
            };

            readings.push(WeatherReading {
                time,
                temperature_c,
                relative_humidity_percent: humidity_percent,
                dew_point_c,
                weather_code: code,
                weather_description: weather_codes::describe(code).to_string(),
                apparent_temperature_c: apparent[i],
                wind_speed_kmh: wind_speed[i],
                wind_direction_degrees: wind_direction[i],
                wind_gusts_kmh: wind_gusts[i],
                precipitation_mm: precipitation[i],
                rain_mm: rain[i],
                snowfall_cm: snowfall[i],
                precipitation_probability_percent: probability[i],
                pressure_hpa: pressure[i],
                cloud_cover_percent: cloud_cover[i],
                uv_index: uv_index[i],
                visibility_m: visibility[i],
            });
        }

        Ok(readings)
    }
}

impl HourlyForecast {
    /// Current wall-clock time at the forecast location
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + TimeDelta::seconds(i64::from(self.utc_offset_seconds))
    }

    /// The reading closest to `target`; ties go to the earlier sample
    pub fn nearest(&self, target: NaiveDateTime) -> WeatherServerResult<&WeatherReading> {
        self.readings
            .iter()
            .min_by_key(|reading| (reading.time - target).num_seconds().abs())
            .ok_or_else(|| WeatherServerError::data_shape("provider returned no hourly readings"))
    }
}

/// Fetches hourly readings from the forecast provider
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    client: Client,
    endpoint: Url,
}

impl WeatherLookup {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub async fn fetch(
        &self,
        coords: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> WeatherServerResult<HourlyForecast> {
        if start > end {
            return Err(WeatherServerError::invalid_argument(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }

        tracing::debug!(
            "Fetching hourly weather for ({}, {}) from {} to {}",
            coords.latitude,
            coords.longitude,
            start,
            end
        );

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("hourly", HOURLY_FIELDS.join(",")),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("{} returned HTTP {}: {}", SERVICE, status, body);
            return Err(WeatherServerError::upstream(
                SERVICE,
                format!("HTTP status {}", status.as_u16()),
            ));
        }

        let body: ForecastResponse = response.json().await.map_err(|e| {
            WeatherServerError::data_shape(format!("invalid weather response: {}", e))
        })?;

        let hourly = body
            .hourly
            .ok_or_else(|| WeatherServerError::data_shape("missing 'hourly' object"))?;

        Ok(HourlyForecast {
            timezone: body.timezone,
            utc_offset_seconds: body.utc_offset_seconds,
            readings: hourly.into_readings()?,
        })
    }
}

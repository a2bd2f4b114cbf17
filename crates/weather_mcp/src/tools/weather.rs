use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc};
use rmcp::model::{Content, JsonObject, Tool};

use crate::core::{
    error::{WeatherServerError, WeatherServerResult},
    forecast::WeatherLookup,
    geocoding::CoordinateResolver,
    models::{
        Coordinates, CurrentWeatherRequest, CurrentWeatherResult, HourlyForecast, Validate,
        WeatherDetailsRequest, WeatherDetailsResult, WeatherRangeRequest, WeatherRangeResult,
    },
    utils,
};
use crate::tools::{ToolHandler, input_schema, json_content, parse_args};

/// Geocoding and forecast clients shared by the weather tools
#[derive(Debug, Clone)]
pub struct WeatherSources {
    resolver: CoordinateResolver,
    lookup: WeatherLookup,
}

impl WeatherSources {
    pub fn new(resolver: CoordinateResolver, lookup: WeatherLookup) -> Self {
        Self { resolver, lookup }
    }

    /// Readings around today, wide enough to cover any UTC offset
    async fn around_now(&self, coords: Coordinates) -> WeatherServerResult<HourlyForecast> {
        let today = Utc::now().date_naive();
        self.lookup
            .fetch(coords, today - TimeDelta::days(1), today + TimeDelta::days(1))
            .await
    }
}

/// `get_current_weather`
pub struct CurrentWeatherTool {
    sources: Arc<WeatherSources>,
}

impl CurrentWeatherTool {
    pub const NAME: &'static str = "get_current_weather";

    pub fn new(sources: Arc<WeatherSources>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl ToolHandler for CurrentWeatherTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn describe(&self) -> Tool {
        Tool::new(
            Self::NAME,
            "Get current weather information for a specified city, using the hourly reading nearest to the present local time",
            input_schema::<CurrentWeatherRequest>(),
        )
    }

    async fn execute(&self, args: JsonObject) -> WeatherServerResult<Vec<Content>> {
        let req: CurrentWeatherRequest = parse_args(args)?;
        req.validate()?;

        let coords = self.sources.resolver.resolve(req.city()).await?;
        let forecast = self.sources.around_now(coords).await?;
        let reading = forecast.nearest(forecast.local_now())?.clone();

        json_content(&CurrentWeatherResult {
            city: req.city().clone(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            timezone: forecast.timezone,
            reading,
        })
    }
}

/// `get_weather_by_datetime_range`
pub struct WeatherRangeTool {
    sources: Arc<WeatherSources>,
}

impl WeatherRangeTool {
    pub const NAME: &'static str = "get_weather_by_datetime_range";

    pub fn new(sources: Arc<WeatherSources>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl ToolHandler for WeatherRangeTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn describe(&self) -> Tool {
        Tool::new(
            Self::NAME,
            "Get hourly weather information for a specified city between start and end dates (inclusive)",
            input_schema::<WeatherRangeRequest>(),
        )
    }

    async fn execute(&self, args: JsonObject) -> WeatherServerResult<Vec<Content>> {
        let req: WeatherRangeRequest = parse_args(args)?;
        req.validate()?;

        let start = utils::parse_date("start_date", req.start_date())?;
        let end = utils::parse_date("end_date", req.end_date())?;
        if start > end {
            return Err(WeatherServerError::invalid_argument(format!(
                "start_date {} must not be after end_date {}",
                start, end
            )));
        }

        let coords = self.sources.resolver.resolve(req.city()).await?;
        let forecast = self.sources.lookup.fetch(coords, start, end).await?;

        json_content(&WeatherRangeResult {
            city: req.city().clone(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            timezone: forecast.timezone,
            start_date: start.to_string(),
            end_date: end.to_string(),
            weather_data: forecast.readings,
        })
    }
}

/// `get_weather_details`
pub struct WeatherDetailsTool {
    sources: Arc<WeatherSources>,
}

impl WeatherDetailsTool {
    pub const NAME: &'static str = "get_weather_details";

    pub fn new(sources: Arc<WeatherSources>) -> Self {
        Self { sources }
    }
}

/// Date-only input resolves to midday
fn parse_requested_time(value: &str) -> WeatherServerResult<NaiveDateTime> {
    if let Some(datetime) = utils::parse_naive_datetime(value) {
        return Ok(datetime);
    }
    let date = NaiveDate::parse_from_str(value, utils::DATE_FORMAT).map_err(|_| {
        WeatherServerError::invalid_argument(format!(
            "datetime must be YYYY-MM-DDTHH:MM, YYYY-MM-DD HH:MM or YYYY-MM-DD, got '{}'",
            value
        ))
    })?;
    date.and_hms_opt(12, 0, 0).ok_or_else(|| {
        WeatherServerError::invalid_argument(format!("no midday on {}", date))
    })
}

/// Local dates holding every hourly sample that could be nearest to `target`
fn days_around(target: NaiveDateTime) -> (NaiveDate, NaiveDate) {
    let half_hour = TimeDelta::minutes(30);
    ((target - half_hour).date(), (target + half_hour).date())
}

#[async_trait]
impl ToolHandler for WeatherDetailsTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn describe(&self) -> Tool {
        Tool::new(
            Self::NAME,
            "Get detailed weather information (wind, precipitation, pressure, cloud cover, UV index, visibility) for a specified city at a local date and time, defaulting to now",
            input_schema::<WeatherDetailsRequest>(),
        )
    }

    async fn execute(&self, args: JsonObject) -> WeatherServerResult<Vec<Content>> {
        let req: WeatherDetailsRequest = parse_args(args)?;
        req.validate()?;

        let requested = req
            .datetime()
            .as_deref()
            .map(parse_requested_time)
            .transpose()?;

        let coords = self.sources.resolver.resolve(req.city()).await?;
        let (forecast, target) = match requested {
            Some(target) => {
                let (start, end) = days_around(target);
                (self.sources.lookup.fetch(coords, start, end).await?, target)
            }
            None => {
                let forecast = self.sources.around_now(coords).await?;
                let now = forecast.local_now();
                (forecast, now)
            }
        };
        let reading = forecast.nearest(target)?.clone();

        json_content(&WeatherDetailsResult {
            city: req.city().clone(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            timezone: forecast.timezone,
            requested_time: target,
            reading,
        })
    }
}

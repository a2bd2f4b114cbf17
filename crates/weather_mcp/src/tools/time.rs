use async_trait::async_trait;
use rmcp::model::{Content, JsonObject, Tool};

use crate::core::{
    error::WeatherServerResult,
    models::{ConvertTimeRequest, CurrentDateTimeRequest, TimeZoneInfoRequest, Validate},
    time::TimeProvider,
};
use crate::tools::{ToolHandler, input_schema, json_content, parse_args};

/// `get_current_datetime`
pub struct CurrentDateTimeTool {
    provider: TimeProvider,
}

impl CurrentDateTimeTool {
    pub const NAME: &'static str = "get_current_datetime";

    pub fn new(provider: TimeProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for CurrentDateTimeTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn describe(&self) -> Tool {
        Tool::new(
            Self::NAME,
            "Get the current date and time in the specified IANA timezone, or in the server's local timezone when none is given",
            input_schema::<CurrentDateTimeRequest>(),
        )
    }

    async fn execute(&self, args: JsonObject) -> WeatherServerResult<Vec<Content>> {
        let req: CurrentDateTimeRequest = parse_args(args)?;
        let result = self.provider.now(req.timezone().as_deref())?;
        json_content(&result)
    }
}

/// `get_timezone_info`
pub struct TimeZoneInfoTool {
    provider: TimeProvider,
}

impl TimeZoneInfoTool {
    pub const NAME: &'static str = "get_timezone_info";

    pub fn new(provider: TimeProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for TimeZoneInfoTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn describe(&self) -> Tool {
        Tool::new(
            Self::NAME,
            "Get information about a timezone: current UTC offset, daylight saving status and abbreviation",
            input_schema::<TimeZoneInfoRequest>(),
        )
    }

    async fn execute(&self, args: JsonObject) -> WeatherServerResult<Vec<Content>> {
        let req: TimeZoneInfoRequest = parse_args(args)?;
        req.validate()?;
        json_content(&self.provider.zone_info(req.timezone())?)
    }
}

/// `convert_time`
pub struct ConvertTimeTool {
    provider: TimeProvider,
}

impl ConvertTimeTool {
    pub const NAME: &'static str = "convert_time";

    pub fn new(provider: TimeProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for ConvertTimeTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn describe(&self) -> Tool {
        Tool::new(
            Self::NAME,
            "Convert a time from one timezone to another",
            input_schema::<ConvertTimeRequest>(),
        )
    }

    async fn execute(&self, args: JsonObject) -> WeatherServerResult<Vec<Content>> {
        let req: ConvertTimeRequest = parse_args(args)?;
        req.validate()?;
        let result =
            self.provider
                .convert(req.time(), req.from_timezone(), req.to_timezone())?;
        json_content(&result)
    }
}

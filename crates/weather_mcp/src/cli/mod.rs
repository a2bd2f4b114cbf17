use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::config::{
    Config, DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use crate::core::error::{WeatherServerError, WeatherServerResult};

/// Weather MCP Server
///
/// Exposes weather and time tools to MCP clients over stdio.
///
/// ## Development
/// ```bash
/// npx @modelcontextprotocol/inspector cargo run --bin mcp-server-weather
/// ```
///
/// ## Configuration
/// Add to your MCP client configuration:
/// ```json
/// {
///   "mcpServers": {
///     "weather": {
///       "command": "mcp-server-weather",
///       "env": {
///         "RUST_LOG": "info"
///       }
///     }
///   }
/// }
/// ```
///
/// ## Environment Variables
/// - `RUST_LOG`: Controls logging verbosity (trace, debug, info, warn, error)
/// - `WEATHER_*`: Fallbacks for every flag below
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-server-weather")]
#[command(about = "An MCP server providing weather lookups and timezone tools")]
#[command(version)]
#[command(
    long_about = "A Model Context Protocol (MCP) server exposing current weather, hourly weather ranges, detailed readings, \nand timezone queries and conversions. Weather data comes from the Open-Meteo geocoding and forecast APIs."
)]
pub struct Cli {
    /// Geocoding endpoint used to resolve place names
    #[arg(long, env = "WEATHER_GEOCODING_URL", default_value = DEFAULT_GEOCODING_URL)]
    pub geocoding_url: String,

    /// Forecast endpoint used for hourly weather data
    #[arg(long, env = "WEATHER_FORECAST_URL", default_value = DEFAULT_FORECAST_URL)]
    pub forecast_url: String,

    /// Per-request timeout for upstream providers, in seconds
    #[arg(long, env = "WEATHER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// User-Agent header sent to upstream providers
    #[arg(long, env = "WEATHER_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Proxy URL to use for upstream requests (e.g., http://proxy:8080)
    #[arg(long, env = "WEATHER_PROXY_URL")]
    pub proxy_url: Option<String>,
}

impl Cli {
    /// Parse CLI arguments and convert to configuration
    pub fn parse_config() -> WeatherServerResult<Config> {
        Self::parse().into_config()
    }

    pub fn into_config(self) -> WeatherServerResult<Config> {
        if self.timeout_secs == 0 {
            return Err(WeatherServerError::Configuration {
                message: "timeout must be at least one second".to_string(),
            });
        }

        let mut config = Config::new(
            parse_url("geocoding-url", &self.geocoding_url)?,
            parse_url("forecast-url", &self.forecast_url)?,
        );
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.user_agent = self.user_agent;
        config.proxy_url = self
            .proxy_url
            .as_deref()
            .map(|proxy| parse_url("proxy-url", proxy))
            .transpose()?;

        Ok(config)
    }
}

fn parse_url(flag: &str, value: &str) -> WeatherServerResult<Url> {
    let url = Url::parse(value).map_err(|e| WeatherServerError::Configuration {
        message: format!("--{} '{}' is not a valid URL: {}", flag, value, e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(WeatherServerError::Configuration {
            message: format!("--{} must use http or https, got '{}'", flag, scheme),
        }),
    }
}

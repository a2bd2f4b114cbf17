use std::time::Duration;

use url::Url;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("mcp-server-weather/", env!("CARGO_PKG_VERSION"));

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Config {
    pub geocoding_url: Url,
    pub forecast_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy_url: Option<Url>,
}

impl Config {
    /// Provider endpoints with default client settings
    pub fn new(geocoding_url: Url, forecast_url: Url) -> Self {
        Self {
            geocoding_url,
            forecast_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy_url: None,
        }
    }
}

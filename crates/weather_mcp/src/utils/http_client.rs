use reqwest::{Client, Proxy};

use crate::config::Config;
use crate::core::error::{WeatherServerError, WeatherServerResult};

/// Build the pooled client shared by the geocoding and forecast lookups
pub fn build_client(config: &Config) -> WeatherServerResult<Client> {
    let mut builder = Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.as_str());

    if let Some(proxy_url) = &config.proxy_url {
        let proxy =
            Proxy::all(proxy_url.as_str()).map_err(|e| WeatherServerError::Configuration {
                message: format!("invalid proxy '{}': {}", proxy_url, e),
            })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| WeatherServerError::Configuration {
        message: format!("failed to build HTTP client: {}", e),
    })
}

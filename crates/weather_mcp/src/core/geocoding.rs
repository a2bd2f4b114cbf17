use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::core::{
    error::{WeatherServerError, WeatherServerResult},
    models::Coordinates,
};

const SERVICE: &str = "Geocoding";

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    // Open-Meteo omits the key entirely when nothing matches
    #[serde(default)]
    results: Vec<Coordinates>,
}

/// Resolves free-text place names to coordinates
#[derive(Debug, Clone)]
pub struct CoordinateResolver {
    client: Client,
    endpoint: Url,
}

impl CoordinateResolver {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub async fn resolve(&self, place_name: &str) -> WeatherServerResult<Coordinates> {
        let place_name = place_name.trim();
        if place_name.is_empty() {
            return Err(WeatherServerError::invalid_argument(
                "place name must not be empty",
            ));
        }

        tracing::debug!("Resolving coordinates for '{}'", place_name);

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("name", place_name),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
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

        let body: GeocodingResponse = response.json().await.map_err(|e| {
            WeatherServerError::data_shape(format!("invalid geocoding response: {}", e))
        })?;

        body.results
            .into_iter()
            .next()
            .ok_or_else(|| WeatherServerError::NotFound {
                place: place_name.to_string(),
            })
    }
}

/// Classify a reqwest failure without leaking the full error chain to callers
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> WeatherServerError {
    tracing::warn!("{} request error: {:?}", service, err);

    let message = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request could not be completed"
    };
    WeatherServerError::upstream(service, message)
}

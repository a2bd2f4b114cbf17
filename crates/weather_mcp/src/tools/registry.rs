use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::Value;

use crate::config::Config;
use crate::core::{
    error::{WeatherServerError, WeatherServerResult},
    forecast::WeatherLookup,
    geocoding::CoordinateResolver,
    time::TimeProvider,
};
use crate::tools::{
    ToolHandler,
    time::{ConvertTimeTool, CurrentDateTimeTool, TimeZoneInfoTool},
    weather::{CurrentWeatherTool, WeatherDetailsTool, WeatherRangeTool, WeatherSources},
};
use crate::utils::build_client;

/// Catalog of tool handlers, listed in registration order
///
/// Built once at startup and shared read-only afterwards.
pub struct ToolRegistry {
    handlers: Vec<Box<dyn ToolHandler>>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registry holding all weather and time tools
    pub fn with_default_tools(config: &Config, time: TimeProvider) -> WeatherServerResult<Self> {
        let client = build_client(config)?;
        let sources = Arc::new(WeatherSources::new(
            CoordinateResolver::new(client.clone(), config.geocoding_url.clone()),
            WeatherLookup::new(client, config.forecast_url.clone()),
        ));

        let mut registry = Self::new();
        registry.register(CurrentWeatherTool::new(sources.clone()))?;
        registry.register(WeatherRangeTool::new(sources.clone()))?;
        registry.register(WeatherDetailsTool::new(sources))?;
        registry.register(CurrentDateTimeTool::new(time.clone()))?;
        registry.register(TimeZoneInfoTool::new(time.clone()))?;
        registry.register(ConvertTimeTool::new(time))?;

        tracing::info!("Registered {} tool handlers", registry.len());
        Ok(registry)
    }

    pub fn register(&mut self, handler: impl ToolHandler + 'static) -> WeatherServerResult<()> {
        let name = handler.name();
        if self.index.contains_key(name) {
            return Err(WeatherServerError::DuplicateTool {
                name: name.to_string(),
            });
        }

        self.index.insert(name, self.handlers.len());
        self.handlers.push(Box::new(handler));
        tracing::info!("Registered tool handler: {}", name);
        Ok(())
    }

    /// Descriptors for every registered tool
    pub fn list(&self) -> Vec<Tool> {
        self.handlers.iter().map(|h| h.describe()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    fn get(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.index.get(name).map(|&i| self.handlers[i].as_ref())
    }

    /// Run a tool, reporting any failure as error content
    pub async fn dispatch(&self, name: &str, args: Value) -> CallToolResult {
        match self.try_dispatch(name, args).await {
            Ok(content) => {
                tracing::info!("Tool {} executed successfully", name);
                CallToolResult::success(content)
            }
            Err(err) => {
                tracing::error!("Error executing tool {}: {:?}", name, err);
                CallToolResult::error(vec![Content::text(format!(
                    "Error executing tool '{}': {}",
                    name, err
                ))])
            }
        }
    }

    async fn try_dispatch(&self, name: &str, args: Value) -> WeatherServerResult<Vec<Content>> {
        let Value::Object(args) = args else {
            return Err(WeatherServerError::invalid_argument(
                "arguments must be a JSON object",
            ));
        };

        let handler = self.get(name).ok_or_else(|| WeatherServerError::UnknownTool {
            name: name.to_string(),
        })?;

        tracing::info!(
            "Executing tool: {} with arguments: {:?}",
            name,
            args.keys().collect::<Vec<_>>()
        );
        handler.execute(args).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rmcp::model::JsonObject;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn registry_for(server_uri: &str) -> ToolRegistry {
        let config = Config::new(
            Url::parse(&format!("{}/v1/search", server_uri)).unwrap(),
            Url::parse(&format!("{}/v1/forecast", server_uri)).unwrap(),
        );
        ToolRegistry::with_default_tools(&config, TimeProvider::with_local_timezone(chrono_tz::UTC))
            .unwrap()
    }

    fn offline_registry() -> ToolRegistry {
        registry_for("http://127.0.0.1:9")
    }

    fn text(result: &CallToolResult) -> &str {
        assert_eq!(result.content.len(), 1);
        &result.content[0].as_text().unwrap().text
    }

    async fn mount_geocoding(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_forecast(server: &MockServer, hourly: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timezone": "America/New_York",
                "utc_offset_seconds": -18000,
                "hourly": hourly
            })))
            .mount(server)
            .await;
    }

    fn new_york() -> Value {
        json!({"results": [{"latitude": 40.7128, "longitude": -74.0060}]})
    }

    fn four_samples() -> Value {
        json!({
            "time": [
                "2024-01-01T12:00",
                "2024-01-01T13:00",
                "2024-01-02T12:00",
                "2024-01-02T13:00"
            ],
            "temperature_2m": [20.0, 21.0, 22.0, 23.0],
            "relative_humidity_2m": [65, 66, 67, 68],
            "dew_point_2m": [13.0, 14.0, 15.0, 16.0],
            "weather_code": [0, 1, 0, 1]
        })
    }

    struct EchoTool;

    #[async_trait::async_trait]
    impl ToolHandler for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn describe(&self) -> Tool {
            Tool::new("echo", "Echo arguments", Arc::new(JsonObject::new()))
        }

        async fn execute(&self, args: JsonObject) -> WeatherServerResult<Vec<Content>> {
            Ok(vec![Content::text(Value::Object(args).to_string())])
        }
    }

    #[test]
    fn test_list_returns_one_descriptor_per_handler() {
        let registry = offline_registry();
        let tools = registry.list();

        assert_eq!(tools.len(), 6);
        assert_eq!(
            tools.iter().map(|t| t.name.as_ref()).collect::<Vec<_>>(),
            registry.names()
        );
        let unique: HashSet<_> = tools.iter().map(|t| t.name.to_string()).collect();
        assert_eq!(unique.len(), tools.len());
        assert!(tools.iter().all(|t| t.description.is_some()));
    }

    #[test]
    fn test_registration_order_is_preserved() {
        assert_eq!(
            offline_registry().names(),
            vec![
                "get_current_weather",
                "get_weather_by_datetime_range",
                "get_weather_details",
                "get_current_datetime",
                "get_timezone_info",
                "convert_time",
            ]
        );
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        let err = registry.register(EchoTool).unwrap_err();
        assert!(matches!(err, WeatherServerError::DuplicateTool { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_reports_error_content() {
        let registry = offline_registry();
        let result = registry.dispatch("get_forecast", json!({})).await;

        assert_eq!(result.is_error, Some(true));
        let message = text(&result);
        assert!(message.contains("get_forecast"));
        assert!(message.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_non_object_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        let result = registry.dispatch("echo", json!(["a", "b"])).await;
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("arguments must be a JSON object"));

        let result = registry.dispatch("echo", json!({"a": 1})).await;
        assert_ne!(result.is_error, Some(true));
        assert_eq!(text(&result), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_dispatch_invalid_arguments_reports_error_content() {
        let registry = offline_registry();
        let result = registry
            .dispatch("convert_time", json!({"time": "12:00"}))
            .await;

        assert_eq!(result.is_error, Some(true));
        let message = text(&result);
        assert!(message.starts_with("Error executing tool 'convert_time': Invalid argument"));
    }

    #[tokio::test]
    async fn test_current_weather_round_trip() {
        let server = MockServer::start().await;
        mount_geocoding(&server, new_york()).await;
        mount_forecast(
            &server,
            json!({
                "time": ["2024-01-01T12:00", "2024-01-01T13:00"],
                "temperature_2m": [20.0, 21.0],
                "relative_humidity_2m": [65, 66],
                "dew_point_2m": [13.0, 14.0],
                "weather_code": [0, 1]
            }),
        )
        .await;

        let registry = registry_for(&server.uri());
        let result = registry
            .dispatch("get_current_weather", json!({"city": "New York"}))
            .await;

        assert_ne!(result.is_error, Some(true));
        let body: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(body["city"], "New York");
        assert_eq!(body["latitude"], 40.7128);
        assert_eq!(body["longitude"], -74.006);
        // Both samples lie in the past, so the latest one is nearest to now
        assert_eq!(body["time"], "2024-01-01T13:00:00");
        assert_eq!(body["weather_code"], 1);
        assert_eq!(body["weather_description"], "Mainly clear");
    }

    #[tokio::test]
    async fn test_current_weather_unknown_city_reports_not_found() {
        let server = MockServer::start().await;
        mount_geocoding(&server, json!({"results": []})).await;

        let registry = registry_for(&server.uri());
        let result = registry
            .dispatch("get_current_weather", json!({"city": "Atlantis"}))
            .await;

        assert_eq!(result.is_error, Some(true));
        let message = text(&result);
        assert!(message.contains("Atlantis"));
        assert!(message.contains("not found"));
    }

    #[tokio::test]
    async fn test_upstream_failure_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let registry = registry_for(&server.uri());
        let result = registry
            .dispatch("get_current_weather", json!({"city": "Paris"}))
            .await;

        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("HTTP status 500"));
    }

    #[tokio::test]
    async fn test_malformed_weather_data_reports_shape_error() {
        let server = MockServer::start().await;
        mount_geocoding(&server, new_york()).await;
        mount_forecast(
            &server,
            json!({
                "time": ["2024-01-01T12:00", "2024-01-01T13:00"],
                "temperature_2m": [20.0, 21.0],
                "relative_humidity_2m": [65],
                "dew_point_2m": [13.0, 14.0],
                "weather_code": [0, 1]
            }),
        )
        .await;

        let registry = registry_for(&server.uri());
        let result = registry
            .dispatch("get_current_weather", json!({"city": "New York"}))
            .await;

        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("Unexpected response shape"));
    }

    #[tokio::test]
    async fn test_weather_range_returns_every_sample_in_order() {
        let server = MockServer::start().await;
        mount_geocoding(&server, new_york()).await;
        mount_forecast(&server, four_samples()).await;

        let registry = registry_for(&server.uri());
        let result = registry
            .dispatch(
                "get_weather_by_datetime_range",
                json!({
                    "city": "New York",
                    "start_date": "2024-01-01",
                    "end_date": "2024-01-02"
                }),
            )
            .await;

        assert_ne!(result.is_error, Some(true));
        let body: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(body["start_date"], "2024-01-01");
        assert_eq!(body["end_date"], "2024-01-02");

        let data = body["weather_data"].as_array().unwrap();
        assert_eq!(data.len(), 4);

        let hourly = four_samples();
        for (i, reading) in data.iter().enumerate() {
            let expected_time = format!("{}:00", hourly["time"][i].as_str().unwrap());
            assert_eq!(reading["time"], expected_time.as_str());
            assert_eq!(reading["temperature_c"], hourly["temperature_2m"][i]);
            assert_eq!(reading["dew_point_c"], hourly["dew_point_2m"][i]);
            assert_eq!(reading["weather_code"], hourly["weather_code"][i]);
        }
        assert_eq!(data[0]["weather_description"], "Clear sky");
        assert_eq!(data[3]["weather_description"], "Mainly clear");
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let server = MockServer::start().await;
        mount_geocoding(&server, new_york()).await;
        mount_forecast(&server, four_samples()).await;

        let registry = registry_for(&server.uri());
        let args = json!({
            "city": "New York",
            "start_date": "2024-01-01",
            "end_date": "2024-01-02"
        });

        let first = registry
            .dispatch("get_weather_by_datetime_range", args.clone())
            .await;
        let second = registry
            .dispatch("get_weather_by_datetime_range", args)
            .await;
        assert_eq!(text(&first), text(&second));

        let convert = json!({
            "time": "2024-07-15T12:00",
            "from_timezone": "UTC",
            "to_timezone": "America/New_York"
        });
        let first = registry.dispatch("convert_time", convert.clone()).await;
        let second = registry.dispatch("convert_time", convert).await;
        assert_eq!(text(&first), text(&second));
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_do_not_interfere() {
        let server = MockServer::start().await;
        mount_geocoding(&server, new_york()).await;
        mount_forecast(&server, four_samples()).await;

        let registry = Arc::new(registry_for(&server.uri()));
        let range = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .dispatch(
                        "get_weather_by_datetime_range",
                        json!({
                            "city": "New York",
                            "start_date": "2024-01-01",
                            "end_date": "2024-01-02"
                        }),
                    )
                    .await
            })
        };
        let info = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .dispatch("get_timezone_info", json!({"timezone": "UTC"}))
                    .await
            })
        };

        let range = range.await.unwrap();
        let info = info.await.unwrap();
        assert_ne!(range.is_error, Some(true));
        assert_ne!(info.is_error, Some(true));
        assert!(text(&info).contains("\"utc_offset\": \"+00:00\""));
    }
}

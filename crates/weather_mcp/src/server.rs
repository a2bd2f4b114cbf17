use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::{
    error::{McpResult, WeatherServerError, WeatherServerResult},
    time::TimeProvider,
    utils::AVAILABLE_RESOURCES,
};
use crate::tools::ToolRegistry;

/// Weather MCP Server backed by the tool registry
#[derive(Clone)]
pub struct WeatherService {
    registry: Arc<ToolRegistry>,
    config: Arc<Config>,
    local_timezone_name: String,
}

impl WeatherService {
    pub fn new(config: Config) -> WeatherServerResult<Self> {
        let time = TimeProvider::new();
        let local_timezone_name = time.local_timezone().to_string();
        let registry = ToolRegistry::with_default_tools(&config, time)?;

        Ok(Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            local_timezone_name,
        })
    }

    fn create_resource_text(&self, uri: &str, name: &str) -> Resource {
        RawResource::new(uri, name.to_string()).no_annotation()
    }

    fn generate_status_content(&self) -> String {
        format!(
            r#"Weather MCP Server Status

Server: Running
Local Timezone: {}
Tools Available: {}
Registered Tools: {}
Resources Available: {}

Upstream Providers:
- Geocoding: {}
- Forecast: {}
- Request Timeout: {}s"#,
            self.local_timezone_name,
            self.registry.len(),
            self.registry.names().join(", "),
            AVAILABLE_RESOURCES.len(),
            self.config.geocoding_url,
            self.config.forecast_url,
            self.config.timeout.as_secs()
        )
    }

    fn generate_help_content(&self) -> String {
        format!(
            r#"Weather MCP Server Help

WEATHER TOOLS:
- get_current_weather: Current conditions for a city
  - city: City or place name (required)
  - Example: {{"city": "Tokyo"}}

- get_weather_by_datetime_range: Hourly readings between two dates
  - city: City or place name (required)
  - start_date: YYYY-MM-DD (required)
  - end_date: YYYY-MM-DD, inclusive (required)
  - Example: {{"city": "Paris", "start_date": "2024-01-01", "end_date": "2024-01-02"}}

- get_weather_details: Detailed reading nearest to a local time
  - city: City or place name (required)
  - datetime: YYYY-MM-DDTHH:MM or YYYY-MM-DD (optional, defaults to now)
  - Example: {{"city": "London", "datetime": "2024-01-01T15:00"}}

TIME TOOLS:
- get_current_datetime: Current time in a timezone
  - timezone: IANA timezone name (optional, defaults to {})
  - Example: {{"timezone": "America/New_York"}}

- get_timezone_info: UTC offset, DST status and abbreviation
  - timezone: IANA timezone name (required)
  - Example: {{"timezone": "Europe/Berlin"}}

- convert_time: Convert a time between timezones
  - time: HH:MM, YYYY-MM-DDTHH:MM[:SS] or RFC 3339 (required)
  - from_timezone: Source IANA timezone name (required)
  - to_timezone: Target IANA timezone name (required)
  - Example: {{"time": "2024-07-15T12:00", "from_timezone": "UTC", "to_timezone": "Asia/Tokyo"}}

RESOURCES:
- weather://status: Server status and upstream configuration
- weather://help: This help documentation

NOTES:
- Weather times are local to the requested city
- Weather codes follow the WMO interpretation table
- Failed calls return a single text block starting with "Error executing tool""#,
            self.local_timezone_name
        )
    }
}

impl ServerHandler for WeatherService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "Weather MCP Server. Tools: {}. Local timezone: {}. Use city names for weather and IANA timezone names for time.",
                self.registry.names().join(", "),
                self.local_timezone_name
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> McpResult<ListToolsResult> {
        Ok(ListToolsResult {
            tools: self.registry.list(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> McpResult<CallToolResult> {
        let args = Value::Object(request.arguments.unwrap_or_default());

        dispatch_cancellable(&self.registry, &request.name, args, &context.ct)
            .await
            .map_err(McpError::from)
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> McpResult<ListResourcesResult> {
        Ok(ListResourcesResult {
            resources: vec![
                self.create_resource_text("weather://status", "server-status"),
                self.create_resource_text("weather://help", "help-documentation"),
            ],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> McpResult<ReadResourceResult> {
        match uri.as_str() {
            "weather://status" => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(self.generate_status_content(), uri)],
            }),
            "weather://help" => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(self.generate_help_content(), uri)],
            }),
            _ => Err(WeatherServerError::ResourceNotFound {
                uri: uri.to_string(),
            }
            .into()),
        }
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> McpResult<ListResourceTemplatesResult> {
        Ok(ListResourceTemplatesResult {
            next_cursor: None,
            resource_templates: Vec::new(),
        })
    }

    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> McpResult<InitializeResult> {
        tracing::info!("Weather MCP Server initialized successfully");
        Ok(self.get_info())
    }
}

/// Race a dispatch against the request's cancellation token
///
/// Dropping the dispatch future aborts any in-flight upstream request.
pub(crate) async fn dispatch_cancellable(
    registry: &ToolRegistry,
    name: &str,
    args: Value,
    ct: &CancellationToken,
) -> WeatherServerResult<CallToolResult> {
    tokio::select! {
        result = registry.dispatch(name, args) => Ok(result),
        _ = ct.cancelled() => {
            tracing::info!("Tool call '{}' cancelled by client", name);
            Err(WeatherServerError::Cancelled {
                tool: name.to_string(),
            })
        }
    }
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    use rmcp::{ServiceExt, transport::stdio};

    tracing::info!(
        "Starting Weather MCP server (geocoding: {}, forecast: {})",
        config.geocoding_url,
        config.forecast_url
    );

    let service = WeatherService::new(config)?
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })?;

    service.waiting().await?;
    Ok(())
}

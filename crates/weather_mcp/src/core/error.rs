use rmcp::ErrorData as McpError;
use rmcp::serde_json::json;

const ERROR_RESOURCE_NOT_FOUND: &str = "resource_not_found";
const ERROR_CANCELLED: &str = "request_cancelled";

/// Failures raised by the weather and time tools and by server startup
#[derive(Debug, thiserror::Error)]
pub enum WeatherServerError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },
    #[error("Location '{place}' not found")]
    NotFound { place: String },
    #[error("{service} request failed: {message}")]
    Upstream { service: String, message: String },
    #[error("Unexpected response shape: {message}")]
    DataShape { message: String },
    #[error("Unknown timezone: {timezone}")]
    UnknownTimezone { timezone: String },
    #[error("Tool already registered: {name}")]
    DuplicateTool { name: String },
    #[error("Resource not found: {uri}")]
    ResourceNotFound { uri: String },
    #[error("Failed to serialize result: {message}")]
    Serialization { message: String },
    #[error("Configuration validation failed: {message}")]
    Configuration { message: String },
    #[error("Logging initialization failed: {0}")]
    LoggingInitialization(String),
    #[error("Tool call '{tool}' was cancelled")]
    Cancelled { tool: String },
}

impl WeatherServerError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::DataShape {
            message: message.into(),
        }
    }

    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

/// Only the resource and cancellation paths reach the transport as protocol
/// errors; tool failures become error content in the registry.
impl From<WeatherServerError> for McpError {
    fn from(err: WeatherServerError) -> Self {
        match err {
            WeatherServerError::ResourceNotFound { uri } => McpError::resource_not_found(
                ERROR_RESOURCE_NOT_FOUND,
                Some(json!({
                    "uri": uri,
                    "available_resources": crate::core::utils::AVAILABLE_RESOURCES
                })),
            ),
            WeatherServerError::Cancelled { tool } => {
                McpError::internal_error(ERROR_CANCELLED, Some(json!({ "tool": tool })))
            }
            other => McpError::internal_error(other.to_string(), None),
        }
    }
}

pub type WeatherServerResult<T> = Result<T, WeatherServerError>;
pub type McpResult<T> = Result<T, McpError>;

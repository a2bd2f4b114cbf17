//! Tool handlers and the registry that dispatches to them.

pub mod registry;
pub mod time;
pub mod weather;

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{Content, JsonObject, Tool};
use rmcp::schemars::{self, JsonSchema};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::core::error::{WeatherServerError, WeatherServerResult};

pub use registry::ToolRegistry;

/// A named operation exposed to MCP clients
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Unique tool name used for dispatch
    fn name(&self) -> &'static str;

    /// Descriptor advertised through `tools/list`
    fn describe(&self) -> Tool;

    /// Validate the argument object and run the operation
    async fn execute(&self, args: JsonObject) -> WeatherServerResult<Vec<Content>>;
}

/// JSON Schema for a request type, as an MCP input schema
pub(crate) fn input_schema<T: JsonSchema>() -> Arc<JsonObject> {
    let schema = schemars::schema_for!(T);
    let mut object = match serde_json::to_value(schema) {
        Ok(Value::Object(object)) => object,
        _ => JsonObject::new(),
    };
    object.remove("$schema");
    object
        .entry("type")
        .or_insert_with(|| Value::String("object".to_string()));
    Arc::new(object)
}

/// Deserialize tool arguments into a typed request
pub(crate) fn parse_args<T: DeserializeOwned>(args: JsonObject) -> WeatherServerResult<T> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| WeatherServerError::invalid_argument(e.to_string()))
}

/// Render a result as a single pretty-printed JSON text block
pub(crate) fn json_content<T: Serialize>(result: &T) -> WeatherServerResult<Vec<Content>> {
    let text =
        serde_json::to_string_pretty(result).map_err(|e| WeatherServerError::Serialization {
            message: e.to_string(),
        })?;
    Ok(vec![Content::text(text)])
}

//! Mem0 memory tools module.
//!
//! - `client`: authenticated request executor for the Mem0 REST API
//! - `add`: store conversation content as memories
//! - `search`: semantic retrieval of stored memories
//!
//! Both tools are stateless: one outbound request per call, response returned verbatim.

pub mod add;
pub mod client;
pub mod search;

pub use add::{AddMemoryParams, AddMemoryTool, MemoryMessage};
pub use client::{
    ADD_MEMORY_ENDPOINT, Mem0Client, MemoryApiError, MemoryErrorKind, SEARCH_MEMORIES_ENDPOINT,
};
pub use search::{SearchMemoriesParams, SearchMemoriesTool};

use rmcp::model::{CallToolResult, Content};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::domains::tools::ToolError;

/// Decode a tool-call argument object into typed parameters.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::invalid_arguments(e.to_string()))
}

/// Convert an executor outcome into the result handed back to the MCP host.
///
/// The API response is passed through untouched: as JSON text, and also as
/// structured content when it is an object. Failures become error results
/// whose text is the full diagnostic message.
pub fn into_call_tool_result(outcome: Result<Value, MemoryApiError>) -> CallToolResult {
    match outcome {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            let structured_content = value.is_object().then_some(value);
            CallToolResult {
                content: vec![Content::text(text)],
                structured_content,
                is_error: Some(false),
                meta: None,
            }
        }
        Err(e) => {
            warn!("Mem0 tool call failed: {}", e);
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    }
}

// An explicit null for a field that is always sent means "use the default".

fn or_default_if_null<'de, D, T>(deserializer: D, default: fn() -> T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_else(default))
}

fn default_if_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    or_default_if_null(deserializer, T::default)
}

// Include policy helpers: optional fields are sent only when they carry a value.

fn present_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn present_map(value: &Option<Map<String, Value>>) -> Option<&Map<String, Value>> {
    value.as_ref().filter(|m| !m.is_empty())
}

fn present_list<T>(value: &Option<Vec<T>>) -> Option<&[T]> {
    value.as_deref().filter(|l| !l.is_empty())
}

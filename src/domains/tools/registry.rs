//! Tool Registry - central listing and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - Direct in-process dispatch of tool calls by name
//! - Tool metadata for listing

use std::sync::Arc;
use tracing::warn;

use rmcp::model::CallToolResult;
use serde_json::{Map, Value};

use crate::core::config::Config;

use super::ToolError;
use super::definitions::memory::parse_arguments;
use super::definitions::{AddMemoryTool, Mem0Client, SearchMemoriesTool};

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    client: Arc<Mem0Client>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            client: Arc::new(Mem0Client::new(&config.mem0)),
        }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![AddMemoryTool::NAME, SearchMemoriesTool::NAME]
    }

    /// Dispatch a tool call by name.
    ///
    /// `arguments` must be a JSON object (or null for no arguments). API
    /// failures come back as an error `CallToolResult`, not as `Err`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, ToolError> {
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::invalid_arguments(format!(
                    "arguments must be an object, got {other}"
                )));
            }
        };

        match name {
            AddMemoryTool::NAME => {
                let params = parse_arguments(args)?;
                Ok(AddMemoryTool::execute(&params, &self.client).await)
            }
            SearchMemoriesTool::NAME => {
                let params = parse_arguments(args)?;
                Ok(SearchMemoriesTool::execute(&params, &self.client).await)
            }
            _ => {
                warn!(
                    "Unknown tool requested: {} (available: {})",
                    name,
                    self.tool_names().join(", ")
                );
                Err(ToolError::not_found(name))
            }
        }
    }
}

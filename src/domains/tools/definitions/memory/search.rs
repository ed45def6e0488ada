//! Search memories tool definition.
//!
//! Semantic retrieval of stored memories (`POST /v2/memories/search/`).

use futures::FutureExt;
use reqwest::Method;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::add::{default_version, version_or_default};
use super::client::{Mem0Client, MemoryApiError, SEARCH_MEMORIES_ENDPOINT};
use super::{
    default_if_null, into_call_tool_result, or_default_if_null, parse_arguments, present_list,
    present_str,
};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the search memories tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchMemoriesParams {
    /// The search text or question to find related memories for.
    pub query: String,

    /// Filters narrowing the search scope, e.g. {"user_id": "alice"} or
    /// {"AND": [{"agent_id": "assistant"}, {"created_at": {"gte": "2024-01-01"}}]}.
    pub filters: Map<String, Value>,

    /// Maximum number of memories to return. Default: 10.
    #[serde(default = "default_top_k", deserialize_with = "top_k_or_default")]
    pub top_k: i64,

    /// Specific fields to include in the returned memory objects.
    #[serde(default)]
    pub fields: Option<Vec<String>>,

    /// Rerank results for higher relevance. Default: false.
    #[serde(default, deserialize_with = "default_if_null")]
    pub rerank: bool,

    /// Enable exact keyword matching alongside semantic search. Default: false.
    #[serde(default, deserialize_with = "default_if_null")]
    pub keyword_search: bool,

    /// Apply pre-filtering to memories before search. Default: false.
    #[serde(default, deserialize_with = "default_if_null")]
    pub filter_memories: bool,

    /// Minimum similarity score (0.0 to 1.0) a memory needs to be returned. Default: 0.3.
    #[serde(default = "default_threshold", deserialize_with = "threshold_or_default")]
    pub threshold: f64,

    /// Organization ID for multi-tenant setups.
    #[serde(default)]
    pub org_id: Option<String>,

    /// Project ID for multi-project setups.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Memory API version. Default: "v2".
    #[serde(default = "default_version", deserialize_with = "version_or_default")]
    pub version: String,
}

fn default_top_k() -> i64 {
    10
}

fn default_threshold() -> f64 {
    0.3
}

fn top_k_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    or_default_if_null(deserializer, default_top_k)
}

fn threshold_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    or_default_if_null(deserializer, default_threshold)
}

impl SearchMemoriesParams {
    /// Parameters with every optional field at its default.
    pub fn new(query: impl Into<String>, filters: Map<String, Value>) -> Self {
        Self {
            query: query.into(),
            filters,
            top_k: default_top_k(),
            fields: None,
            rerank: false,
            keyword_search: false,
            filter_memories: false,
            threshold: default_threshold(),
            org_id: None,
            project_id: None,
            version: default_version(),
        }
    }

    /// Build the request body sent to Mem0.
    pub fn payload(&self) -> SearchMemoriesPayload<'_> {
        SearchMemoriesPayload {
            query: &self.query,
            filters: &self.filters,
            top_k: self.top_k,
            rerank: self.rerank,
            keyword_search: self.keyword_search,
            filter_memories: self.filter_memories,
            threshold: self.threshold,
            version: &self.version,
            fields: present_list(&self.fields),
            org_id: present_str(&self.org_id),
            project_id: present_str(&self.project_id),
        }
    }
}

// ============================================================================
// Request Payload
// ============================================================================

/// Body of `POST /v2/memories/search/`.
///
/// The first eight fields are always sent; `fields`, `org_id` and
/// `project_id` only when supplied.
#[derive(Debug, Serialize)]
pub struct SearchMemoriesPayload<'a> {
    query: &'a str,
    filters: &'a Map<String, Value>,
    top_k: i64,
    rerank: bool,
    keyword_search: bool,
    filter_memories: bool,
    threshold: f64,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    org_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Search memories tool - semantic lookup over stored memories.
pub struct SearchMemoriesTool;

impl SearchMemoriesTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search_memories";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Retrieve relevant memories by semantic similarity to a query. \
         Use this to recall past information, context, or preferences.\n\
         \n\
         'filters' is required and scopes the search, e.g. {\"user_id\": \"default_user\"}. \
         Results below 'threshold' (default 0.3) are dropped; at most 'top_k' (default 10) are returned.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(query = %params.query, top_k = params.top_k))]
    pub async fn execute(params: &SearchMemoriesParams, client: &Mem0Client) -> CallToolResult {
        info!("Search memories tool called");
        into_call_tool_result(Self::search(params, client).await)
    }

    /// Send the search request and return the raw API response.
    pub async fn search(
        params: &SearchMemoriesParams,
        client: &Mem0Client,
    ) -> Result<Value, MemoryApiError> {
        client
            .request(Method::POST, SEARCH_MEMORIES_ENDPOINT, Some(&params.payload()))
            .await
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: schema_for_type::<SearchMemoriesParams>().into(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: Some("Search memories".into()),
        }
    }

    /// Create a ToolRoute for the rmcp router.
    pub fn create_route<S>(client: Arc<Mem0Client>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let client = client.clone();
            async move {
                let params: SearchMemoriesParams = parse_arguments(args).map_err(McpError::from)?;
                Ok(Self::execute(&params, &client).await)
            }
            .boxed()
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

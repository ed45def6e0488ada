//! Add memory tool definition.
//!
//! Stores conversation messages in Mem0 (`POST /v1/memories/`).

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

use super::client::{ADD_MEMORY_ENDPOINT, Mem0Client, MemoryApiError};
use super::{
    default_if_null, into_call_tool_result, or_default_if_null, parse_arguments, present_map,
    present_str,
};

// ============================================================================
// Tool Parameters
// ============================================================================

/// A single conversation message.
///
/// Keys other than `role` and `content` (e.g. `name`) are forwarded as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MemoryMessage {
    /// Speaker role, e.g. "user" or "assistant".
    pub role: String,

    /// Message text.
    pub content: String,

    /// Any additional message keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemoryMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            extra: Map::new(),
        }
    }
}

/// Parameters for the add memory tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddMemoryParams {
    /// Conversation messages, oldest first. Each has a 'role' and a 'content'.
    pub messages: Vec<MemoryMessage>,

    /// Identifier for the user (default: "default_user").
    #[serde(default = "default_user_id")]
    pub user_id: Option<String>,

    /// Identifier for the agent/assistant (default: "assistant").
    #[serde(default = "default_agent_id")]
    pub agent_id: Option<String>,

    /// Identifier for the application.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Identifier for a specific run or session.
    #[serde(default)]
    pub run_id: Option<String>,

    /// Key-value pairs stored alongside the memory.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,

    /// Extract key facts (true) or store the raw messages (false). Default: true.
    #[serde(default = "default_true", deserialize_with = "true_if_null")]
    pub infer: bool,

    /// Custom categories for memory classification.
    #[serde(default)]
    pub custom_categories: Option<Map<String, Value>>,

    /// Project-specific guidelines for handling memories.
    #[serde(default)]
    pub custom_instructions: Option<String>,

    /// Preferences to include in the memory.
    #[serde(default)]
    pub includes: Option<String>,

    /// Preferences to exclude from the memory.
    #[serde(default)]
    pub excludes: Option<String>,

    /// Process the memory asynchronously. Default: true.
    #[serde(default = "default_true", deserialize_with = "true_if_null")]
    pub async_mode: bool,

    /// Whether the memory is immutable. Default: false.
    #[serde(default, deserialize_with = "default_if_null")]
    pub immutable: bool,

    /// Unix timestamp of the memory.
    #[serde(default)]
    pub timestamp: Option<i64>,

    /// Expiration date of the memory (YYYY-MM-DD).
    #[serde(default)]
    pub expiration_date: Option<String>,

    /// Organization ID for multi-tenant setups.
    #[serde(default)]
    pub org_id: Option<String>,

    /// Project ID for multi-project setups.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Response format, "v1.0" or "v1.1". Default: "v1.1".
    #[serde(default = "default_output_format", deserialize_with = "output_format_or_default")]
    pub output_format: String,

    /// Memory API version. Default: "v2".
    #[serde(default = "default_version", deserialize_with = "version_or_default")]
    pub version: String,
}

fn default_user_id() -> Option<String> {
    Some("default_user".to_string())
}

fn default_agent_id() -> Option<String> {
    Some("assistant".to_string())
}

fn default_true() -> bool {
    true
}

fn default_output_format() -> String {
    "v1.1".to_string()
}

pub(super) fn default_version() -> String {
    "v2".to_string()
}

fn true_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    or_default_if_null(deserializer, default_true)
}

fn output_format_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    or_default_if_null(deserializer, default_output_format)
}

pub(super) fn version_or_default<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    or_default_if_null(deserializer, default_version)
}

impl AddMemoryParams {
    /// Parameters with every optional field at its default.
    pub fn new(messages: Vec<MemoryMessage>) -> Self {
        Self {
            messages,
            user_id: default_user_id(),
            agent_id: default_agent_id(),
            app_id: None,
            run_id: None,
            metadata: None,
            infer: true,
            custom_categories: None,
            custom_instructions: None,
            includes: None,
            excludes: None,
            async_mode: true,
            immutable: false,
            timestamp: None,
            expiration_date: None,
            org_id: None,
            project_id: None,
            output_format: default_output_format(),
            version: default_version(),
        }
    }

    /// Build the request body sent to Mem0.
    pub fn payload(&self) -> AddMemoryPayload<'_> {
        AddMemoryPayload {
            messages: &self.messages,
            infer: self.infer,
            async_mode: self.async_mode,
            immutable: self.immutable,
            output_format: &self.output_format,
            version: &self.version,
            user_id: present_str(&self.user_id),
            agent_id: present_str(&self.agent_id),
            app_id: present_str(&self.app_id),
            run_id: present_str(&self.run_id),
            metadata: present_map(&self.metadata),
            custom_categories: present_map(&self.custom_categories),
            custom_instructions: present_str(&self.custom_instructions),
            includes: present_str(&self.includes),
            excludes: present_str(&self.excludes),
            timestamp: self.timestamp,
            expiration_date: present_str(&self.expiration_date),
            org_id: present_str(&self.org_id),
            project_id: present_str(&self.project_id),
        }
    }
}

// ============================================================================
// Request Payload
// ============================================================================

/// Body of `POST /v1/memories/`.
///
/// The first six fields are always sent, defaults included. The rest are
/// omitted unless the caller supplied a non-empty value.
#[derive(Debug, Serialize)]
pub struct AddMemoryPayload<'a> {
    messages: &'a [MemoryMessage],
    infer: bool,
    async_mode: bool,
    immutable: bool,
    output_format: &'a str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_categories: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    includes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    excludes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    org_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Add memory tool - persists conversation content in Mem0.
pub struct AddMemoryTool;

impl AddMemoryTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "add_memory";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Store interaction content (messages) in the memory system. \
         Use this to persist information, user preferences, or conversation context that should be retrievable later.\n\
         \n\
         For best results pass the RECENT CONVERSATION HISTORY (both user and assistant messages) \
         rather than a single message, so the system can infer context and extract accurate memories. Example:\n\
         [\n  \
           {\"role\": \"user\", \"content\": \"I only write Python code.\"},\n  \
           {\"role\": \"assistant\", \"content\": \"Understood, I will focus on Python.\"}\n\
         ]";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(messages = params.messages.len(), user_id = ?params.user_id))]
    pub async fn execute(params: &AddMemoryParams, client: &Mem0Client) -> CallToolResult {
        info!("Add memory tool called");
        into_call_tool_result(Self::add(params, client).await)
    }

    /// Send the add request and return the raw API response.
    pub async fn add(params: &AddMemoryParams, client: &Mem0Client) -> Result<Value, MemoryApiError> {
        client
            .request(Method::POST, ADD_MEMORY_ENDPOINT, Some(&params.payload()))
            .await
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: schema_for_type::<AddMemoryParams>().into(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: Some("Add memory".into()),
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
                let params: AddMemoryParams = parse_arguments(args).map_err(McpError::from)?;
                Ok(Self::execute(&params, &client).await)
            }
            .boxed()
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Mem0Config;
    use serde_json::json;
    use std::collections::BTreeSet;
    use tokio_test::assert_ok;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn python_message() -> Vec<MemoryMessage> {
        vec![MemoryMessage::new("user", "I only write Python code.")]
    }

    fn keys(value: &Value) -> BTreeSet<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    fn mock_client(server: &MockServer) -> Mem0Client {
        Mem0Client::new(&Mem0Config {
            api_key: Some("m0-key".to_string()),
            base_url: server.uri(),
        })
    }

    #[test]
    fn test_default_payload() {
        let params = AddMemoryParams::new(python_message());
        let body = serde_json::to_value(params.payload()).unwrap();

        assert_eq!(body["infer"], true);
        assert_eq!(body["async_mode"], true);
        assert_eq!(body["immutable"], false);
        assert_eq!(body["output_format"], "v1.1");
        assert_eq!(body["version"], "v2");
        assert_eq!(body["user_id"], "default_user");
        assert_eq!(body["agent_id"], "assistant");
        assert!(body.get("metadata").is_none());
        assert!(body.get("app_id").is_none());
        assert!(body.get("run_id").is_none());
        assert_eq!(
            body["messages"],
            json!([{ "role": "user", "content": "I only write Python code." }])
        );
    }

    #[test]
    fn test_params_deserialization_defaults() {
        let params: AddMemoryParams = serde_json::from_value(json!({
            "messages": [{ "role": "user", "content": "hi" }]
        }))
        .unwrap();

        assert_eq!(params.user_id.as_deref(), Some("default_user"));
        assert_eq!(params.agent_id.as_deref(), Some("assistant"));
        assert!(params.infer);
        assert!(params.async_mode);
        assert!(!params.immutable);
        assert_eq!(params.output_format, "v1.1");
        assert_eq!(params.version, "v2");
        assert!(params.timestamp.is_none());
    }

    #[test]
    fn test_always_sent_fields_even_when_overridden() {
        let mut params = AddMemoryParams::new(python_message());
        params.infer = false;
        params.async_mode = false;
        params.immutable = true;
        params.output_format = "v1.0".to_string();
        params.version = "v1".to_string();
        params.user_id = None;
        params.agent_id = None;

        let body = serde_json::to_value(params.payload()).unwrap();
        let expected: BTreeSet<String> = [
            "messages",
            "infer",
            "async_mode",
            "immutable",
            "output_format",
            "version",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(keys(&body), expected);
        assert_eq!(body["infer"], false);
        assert_eq!(body["immutable"], true);
        assert_eq!(body["output_format"], "v1.0");
    }

    #[test]
    fn test_every_supplied_optional_field_is_sent() {
        let params: AddMemoryParams = serde_json::from_value(json!({
            "messages": [{ "role": "user", "content": "hi" }],
            "user_id": "u1",
            "agent_id": "a1",
            "app_id": "app",
            "run_id": "run-7",
            "metadata": { "topic": "languages" },
            "custom_categories": { "tech": "programming languages" },
            "custom_instructions": "Only keep preferences",
            "includes": "languages",
            "excludes": "names",
            "timestamp": 1700000000,
            "expiration_date": "2030-01-01",
            "org_id": "org",
            "project_id": "proj"
        }))
        .unwrap();

        let body = serde_json::to_value(params.payload()).unwrap();
        assert_eq!(keys(&body).len(), 19);
        assert_eq!(body["run_id"], "run-7");
        assert_eq!(body["metadata"], json!({ "topic": "languages" }));
        assert_eq!(body["timestamp"], 1700000000);
        assert_eq!(body["expiration_date"], "2030-01-01");
    }

    #[test]
    fn test_empty_and_null_optionals_are_omitted() {
        let params: AddMemoryParams = serde_json::from_value(json!({
            "messages": [{ "role": "user", "content": "hi" }],
            "user_id": "",
            "agent_id": null,
            "app_id": "",
            "metadata": {},
            "custom_categories": null,
            "includes": ""
        }))
        .unwrap();

        let body = serde_json::to_value(params.payload()).unwrap();
        for key in ["user_id", "agent_id", "app_id", "metadata", "custom_categories", "includes"] {
            assert!(body.get(key).is_none(), "{key} should be omitted");
        }
    }

    #[test]
    fn test_zero_timestamp_is_sent() {
        let mut params = AddMemoryParams::new(python_message());
        params.timestamp = Some(0);
        let body = serde_json::to_value(params.payload()).unwrap();
        assert_eq!(body["timestamp"], 0);
    }

    #[test]
    fn test_message_order_and_roles_preserved() {
        let params: AddMemoryParams = serde_json::from_value(json!({
            "messages": [
                { "role": "user", "content": "first" },
                { "role": "assistant", "content": "second" },
                { "role": "narrator", "content": "" }
            ]
        }))
        .unwrap();

        let body = serde_json::to_value(params.payload()).unwrap();
        let contents: Vec<_> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["first", "second", ""]);
        assert_eq!(body["messages"][2]["role"], "narrator");
    }

    #[test]
    fn test_extra_message_keys_are_forwarded() {
        let params: AddMemoryParams = serde_json::from_value(json!({
            "messages": [{ "role": "user", "content": "hi", "name": "alice" }]
        }))
        .unwrap();

        let body = serde_json::to_value(params.payload()).unwrap();
        assert_eq!(
            body["messages"],
            json!([{ "role": "user", "content": "hi", "name": "alice" }])
        );
        assert_eq!(
            serde_json::to_string(&body["messages"][0]).unwrap(),
            r#"{"role":"user","content":"hi","name":"alice"}"#
        );
    }

    #[test]
    fn test_null_always_sent_fields_take_defaults() {
        let params: AddMemoryParams = serde_json::from_value(json!({
            "messages": [{ "role": "user", "content": "hi" }],
            "infer": null,
            "async_mode": null,
            "immutable": null,
            "output_format": null,
            "version": null
        }))
        .unwrap();

        let body = serde_json::to_value(params.payload()).unwrap();
        assert_eq!(body["infer"], true);
        assert_eq!(body["async_mode"], true);
        assert_eq!(body["immutable"], false);
        assert_eq!(body["output_format"], "v1.1");
        assert_eq!(body["version"], "v2");
    }

    #[test]
    fn test_wrong_type_for_flag_is_rejected() {
        let result = serde_json::from_value::<AddMemoryParams>(json!({
            "messages": [{ "role": "user", "content": "hi" }],
            "infer": "yes"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_messages_are_required() {
        let result = serde_json::from_value::<AddMemoryParams>(json!({ "user_id": "u1" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_marks_only_messages_required() {
        let tool = AddMemoryTool::to_tool();
        assert_eq!(tool.name, "add_memory");
        let required = tool.input_schema.get("required").cloned().unwrap();
        assert_eq!(required, json!(["messages"]));
    }

    #[tokio::test]
    async fn test_add_posts_exact_default_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/memories/"))
            .and(header("Authorization", "Token m0-key"))
            .and(body_json(json!({
                "messages": [{ "role": "user", "content": "I only write Python code." }],
                "infer": true,
                "async_mode": true,
                "immutable": false,
                "output_format": "v1.1",
                "version": "v2",
                "user_id": "default_user",
                "agent_id": "assistant"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "m1", "status": "ok" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let params = AddMemoryParams::new(python_message());
        let value = assert_ok!(AddMemoryTool::add(&params, &client).await);
        assert_eq!(value, json!({ "id": "m1", "status": "ok" }));
    }

    #[tokio::test]
    async fn test_execute_surfaces_api_validation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/memories/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid role"}"#),
            )
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let params = AddMemoryParams::new(vec![MemoryMessage::new("robot", "beep")]);
        let result = AddMemoryTool::execute(&params, &client).await;

        assert!(result.is_error.unwrap_or(false));
        let text = match &result.content[0].raw {
            rmcp::model::RawContent::Text(t) => &t.text,
            _ => panic!("Expected text content"),
        };
        assert!(text.contains("400"));
        assert!(text.contains("invalid role"));
    }

    #[tokio::test]
    async fn test_execute_without_api_key_makes_no_request() {
        let server = MockServer::start().await;
        let client = Mem0Client::new(&Mem0Config {
            api_key: None,
            base_url: server.uri(),
        });

        let result = AddMemoryTool::execute(&AddMemoryParams::new(python_message()), &client).await;

        assert!(result.is_error.unwrap_or(false));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

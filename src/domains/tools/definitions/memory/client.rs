//! Request executor for the Mem0 REST API.
//!
//! Performs one authenticated JSON request per call and folds every failure
//! into [`MemoryApiError`]. No retries, no pooling across calls: each request
//! builds its own HTTP client, which is dropped on every exit path.

use reqwest::{Method, header};
use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::core::config::Mem0Config;

/// Endpoint for storing memories.
pub const ADD_MEMORY_ENDPOINT: &str = "/v1/memories/";

/// Endpoint for semantic memory search.
pub const SEARCH_MEMORIES_ENDPOINT: &str = "/v2/memories/search/";

// ============================================================================
// Errors
// ============================================================================

/// Coarse classification of a [`MemoryApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryErrorKind {
    /// Missing credential, detected before any request is sent.
    Configuration,
    /// The API replied with a non-success status.
    RemoteRequest,
    /// Network, encoding or decoding failure.
    Transport,
}

/// Failure of a single Mem0 API call.
#[derive(Debug, Error)]
pub enum MemoryApiError {
    /// Required configuration is missing. Raised before any network I/O.
    #[error("{0}")]
    Configuration(String),

    /// The API answered with a non-success status. `body` is the raw response text.
    #[error("HTTP error occurred: {status} - {body}")]
    RemoteRequest { status: u16, body: String },

    /// Request construction, network I/O or response decoding failed.
    #[error("An error occurred: {0}")]
    Transport(String),
}

impl MemoryApiError {
    fn missing_api_key() -> Self {
        Self::Configuration("MEM0_API_KEY is not set. Please check your .env file.".to_string())
    }

    /// Which of the three failure classes this is.
    pub fn kind(&self) -> MemoryErrorKind {
        match self {
            Self::Configuration(_) => MemoryErrorKind::Configuration,
            Self::RemoteRequest { .. } => MemoryErrorKind::RemoteRequest,
            Self::Transport(_) => MemoryErrorKind::Transport,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Mem0 API client.
#[derive(Clone)]
pub struct Mem0Client {
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for Mem0Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mem0Client")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Mem0Client {
    /// Create a client from the Mem0 section of the server configuration.
    pub fn new(config: &Mem0Config) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Send one request to `endpoint` (relative to the base URL) and return the decoded JSON body.
    #[instrument(skip(self, method, payload), fields(method = %method))]
    pub async fn request<T>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
    ) -> Result<Value, MemoryApiError>
    where
        T: Serialize + ?Sized,
    {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(MemoryApiError::missing_api_key)?;

        let url = format!("{}{}", self.base_url, endpoint);

        // A 3xx is reported like any other non-success status, never followed.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| transport_failure("building HTTP client", &e))?;

        let mut request = http
            .request(method, &url)
            .header(header::AUTHORIZATION, format!("Token {api_key}"))
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(payload) = payload {
            let body = serde_json::to_vec(payload)
                .map_err(|e| transport_failure("serializing request body", &e))?;
            request = request.body(body);
        }

        debug!("Sending request to {}", url);

        let response = request
            .send()
            .await
            .map_err(|e| transport_failure("sending request", &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            error!(status = status.as_u16(), "Detailed HTTP Error: {}", body);
            return Err(MemoryApiError::RemoteRequest {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_failure("reading response body", &e))?;

        debug!("API response received: {} bytes", bytes.len());

        serde_json::from_slice(&bytes).map_err(|e| transport_failure("decoding response JSON", &e))
    }
}

/// Log the full error chain and wrap it as a transport error.
fn transport_failure(stage: &str, err: &(dyn StdError + 'static)) -> MemoryApiError {
    let chain = error_chain(err);
    error!(error = ?err, "Mem0 request failed while {}: {}", stage, chain);
    MemoryApiError::Transport(chain)
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// ============================================================================
// Tests
// ============================================================================

//! Mem0 MCP Server Library
//!
//! A Model Context Protocol (MCP) server that exposes the Mem0 memory API as
//! two tools: `add_memory` and `search_memories`.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the MCP server handler and the STDIO transport
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: The memory tools and the Mem0 request executor
//!
//! # Example
//!
//! ```rust,no_run
//! use mem0_mcp_server::{core::McpServer, core::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config);
//!     let result = server
//!         .call_tool(
//!             "search_memories",
//!             serde_json::json!({ "query": "favorite language", "filters": { "user_id": "alice" } }),
//!         )
//!         .await?;
//!     println!("{:?}", result.content);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};

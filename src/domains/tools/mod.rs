//! Tools domain module.
//!
//! Tools are executable functions that MCP clients call. This server exposes
//! two: `add_memory` and `search_memories`, both backed by the Mem0 API.
//!
//! ## Architecture
//!
//! - `definitions/` - Tool implementations (one file per tool) and the Mem0 client
//! - `router.rs` - ToolRouter builder used by the MCP server handler
//! - `registry.rs` - Tool listing and direct in-process dispatch
//! - `error.rs` - Tool-specific error types

pub mod definitions;
mod error;
mod registry;
pub mod router;

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use router::build_tool_router;

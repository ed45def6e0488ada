//! Transport layer for the MCP server.
//!
//! MCP hosts launch this server as a child process and talk JSON-RPC over
//! stdin/stdout, so STDIO is the only transport. Logs therefore go to stderr.

mod config;
mod error;
mod service;
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

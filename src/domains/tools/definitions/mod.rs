//! Tool definitions module.
//!
//! This module exports all available tool definitions.

pub mod memory;

pub use memory::{
    AddMemoryParams, AddMemoryTool, Mem0Client, MemoryApiError, MemoryErrorKind, MemoryMessage,
    SearchMemoriesParams, SearchMemoriesTool,
};

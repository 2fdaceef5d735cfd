//! MCP (Model Context Protocol) server implementation.
//!
//! Provides the memory and file-sync tools over stdio for AI assistant
//! integration.

pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::MemoryTools;

//! mcp-demo-client: a small MCP client that lists what a server offers and
//! runs its word counter
//!
//! The client connects to an MCP server over WebSocket, prints the server's
//! resources and capabilities, and invokes the `word_counter` tool on some
//! text. If the tool cannot be used, the words are counted locally instead.
//!
//! # Architecture
//!
//! - **Session**: [`session::RemoteSession`] owns one connection and forwards
//!   three remote operations, sorting failures into closed error kinds
//! - **Fallback policy**: [`invoker::ToolInvoker`] turns every failure of the
//!   word-counter call into a locally computed result
//! - **Connection**: [`mcp::McpClient`] speaks JSON-RPC 2.0 over WebSocket,
//!   and owns timeouts and connection retries
//!
//! # Modules
//!
//! - [`app`] - The walkthrough the binary runs
//! - [`config`] - Configuration loading and validation
//! - [`display`] - Console rendering
//! - [`error`] - Error types
//! - [`invoker`] - Word counter with local fallback
//! - [`mcp`] - MCP protocol implementation
//! - [`session`] - Remote session façade

pub mod app;
pub mod config;
pub mod display;
pub mod error;
pub mod invoker;
pub mod mcp;
pub mod session;

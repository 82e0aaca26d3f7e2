//! Model Context Protocol (MCP) client implementation.
//!
//! This module is the underlying connection the session façade drives. It
//! speaks JSON-RPC 2.0 to an MCP server over a WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         MCP Client                          │
//! │                                                             │
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    │
//! │   │   Client    │───▶│  Protocol   │───▶│  Transport  │    │
//! │   │ (lifecycle) │    │ (JSON-RPC)  │    │ (WebSocket) │    │
//! │   └─────────────┘    └─────────────┘    └─────────────┘    │
//! │          │                                     │            │
//! │          ▼                                     ▼            │
//! │   ┌─────────────┐                      ┌─────────────┐     │
//! │   │ Connection  │                      │  MCP server │     │
//! │   │   (trait)   │                      │ (ws / wss)  │     │
//! │   └─────────────┘                      └─────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::{ClientOptions, Connection, McpClient};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use transport::WebSocketTransport;

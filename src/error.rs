//! Error types for mcp-demo-client.
//!
//! The layers map onto each other as follows:
//!
//! - [`TransportError`] and [`ProtocolError`] come from the WebSocket and
//!   JSON-RPC layers.
//! - [`ClientError`] is what the underlying MCP connection reports; it keeps
//!   "timed out" and "refused" distinguishable from everything else.
//! - [`ConnectError`] and [`OperationError`] are the session façade's closed
//!   error kinds.
//! - [`RunError`] is everything the driver can report to the user.
//!
//! # Security Note
//!
//! Error messages never include the bearer token or header values. Header
//! errors name the header, never its value.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// A message received from the server that is not valid JSON-RPC 2.0.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The payload is not JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The payload is JSON but not a JSON-RPC 2.0 message.
    #[error("invalid JSON-RPC message: {0}")]
    InvalidMessage(&'static str),

    /// A response arrived whose result did not have the expected shape.
    #[error("unexpected {method} result: {source}")]
    UnexpectedResult {
        /// Method whose result could not be decoded.
        method: String,
        /// The underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the WebSocket transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The WebSocket layer failed (handshake, I/O or framing).
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An extra header could not be placed on the upgrade request.
    #[error("invalid header '{name}'")]
    InvalidHeader {
        /// Name of the offending header.
        name: String,
    },

    /// An outgoing message could not be serialised.
    #[error("failed to serialise message: {0}")]
    Encode(#[from] serde_json::Error),

    /// A binary frame did not contain UTF-8 text.
    #[error("received a binary frame that is not UTF-8")]
    NonUtf8Frame,
}

/// Errors reported by the underlying MCP connection.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The endpoint is not a usable WebSocket URL.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The endpoint as configured.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Connecting or waiting for a response took longer than the timeout.
    #[error("no answer within {}s", .timeout.as_secs_f64())]
    Timeout {
        /// The configured timeout.
        timeout: Duration,
    },

    /// The server could not be reached or rejected the connection.
    #[error("connection refused: {0}")]
    Refused(#[source] TransportError),

    /// An operation was attempted without an open connection.
    #[error("not connected")]
    NotConnected,

    /// The server closed the connection while a response was pending.
    #[error("connection closed by server")]
    Closed,

    /// Any other transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server sent something that is not valid JSON-RPC.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server answered with a JSON-RPC error.
    #[error("server error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i32,
        /// Error message from the server.
        message: String,
    },

    /// The tool ran but reported failure (`isError: true`).
    #[error("tool '{tool}' reported an error: {message}")]
    ToolFailed {
        /// Name of the tool.
        tool: String,
        /// Text content of the error result.
        message: String,
    },
}

/// Errors from [`RemoteSession::connect`](crate::session::RemoteSession::connect).
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The connection attempt timed out.
    #[error("Connection timed out: {0}")]
    Timeout(#[source] ClientError),

    /// The connection attempt failed.
    #[error("Connection failed: {0}")]
    Refused(#[source] ClientError),

    /// Anything else went wrong while connecting.
    #[error("Unexpected error: {0}")]
    Unexpected(#[source] ClientError),

    /// `connect` was called on a session that already holds a connection.
    #[error("session is already connected")]
    AlreadyConnected,
}

impl From<ClientError> for ConnectError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Timeout { .. } => Self::Timeout(error),
            ClientError::Refused(_) => Self::Refused(error),
            _ => Self::Unexpected(error),
        }
    }
}

/// Errors from the session's remote operations.
#[derive(Error, Debug)]
pub enum OperationError {
    /// No connection is held.
    #[error("Not connected to MCP server")]
    NotConnected,

    /// The underlying connection failed the operation.
    #[error("{operation} failed: {cause}")]
    Failed {
        /// Operation name (`list_resources`, `get_capabilities` or the tool name).
        operation: String,
        /// The underlying failure.
        #[source]
        cause: ClientError,
    },
}

/// Everything the driver walkthrough can fail with.
#[derive(Error, Debug)]
pub enum RunError {
    /// Connecting to the server failed.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A remote operation failed.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Reading the input text or writing output failed.
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn client_errors_classify_into_connect_errors() {
        let timeout = ClientError::Timeout {
            timeout: Duration::from_secs(5),
        };
        assert!(matches!(
            ConnectError::from(timeout),
            ConnectError::Timeout(_)
        ));

        let refused = ClientError::Refused(TransportError::NonUtf8Frame);
        assert!(matches!(
            ConnectError::from(refused),
            ConnectError::Refused(_)
        ));

        let rpc = ClientError::Rpc {
            code: -32603,
            message: "boom".to_string(),
        };
        assert!(matches!(ConnectError::from(rpc), ConnectError::Unexpected(_)));
    }

    #[test]
    fn connect_error_wraps_description() {
        let error = ConnectError::from(ClientError::Timeout {
            timeout: Duration::from_millis(1500),
        });
        assert_eq!(error.to_string(), "Connection timed out: no answer within 1.5s");
    }

    #[test]
    fn operation_error_names_operation() {
        let error = OperationError::Failed {
            operation: "list_resources".to_string(),
            cause: ClientError::Closed,
        };
        assert_eq!(
            error.to_string(),
            "list_resources failed: connection closed by server"
        );
        assert_eq!(
            OperationError::NotConnected.to_string(),
            "Not connected to MCP server"
        );
    }

    #[test]
    fn header_error_does_not_leak_value() {
        let error = TransportError::InvalidHeader {
            name: "Authorization".to_string(),
        };
        assert_eq!(error.to_string(), "invalid header 'Authorization'");
    }
}

//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! This module defines the core message types used in the Model Context Protocol,
//! seen from the client side: requests and notifications go out, responses,
//! errors, notifications and the occasional server request come in.
//!
//! # Message Types
//!
//! - **Request**: A message expecting a response (has `id` and `method`)
//! - **Response**: A reply to a request (has `id` and `result`)
//! - **Error**: A failed reply (has `id` and `error`)
//! - **Notification**: A one-way message (no `id`, no response expected)
//!
//! # MCP-Specific Constraints
//!
//! - Request IDs must be strings or integers (never `null`)
//! - Request IDs must be unique within a session

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Client name for capability negotiation.
pub const CLIENT_NAME: &str = "mcp-demo-client";

/// A JSON-RPC 2.0 request ID.
///
/// Per the MCP specification, IDs must be strings or integers, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// Unique request identifier.
    pub id: RequestId,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// Validates that this is a well-formed JSON-RPC 2.0 request.
    ///
    /// Returns an error message if validation fails.
    #[must_use]
    pub fn validate(&self) -> Option<&'static str> {
        if self.jsonrpc != "2.0" {
            return Some("jsonrpc field must be \"2.0\"");
        }
        if self.method.is_empty() {
            return Some("method field cannot be empty");
        }
        None
    }
}

/// A JSON-RPC 2.0 notification message.
///
/// Notifications do not have an ID and do not expect a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// The notification method.
    pub method: String,

    /// Optional parameters for the notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Creates a new notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }

    /// The notification a client sends once the initialize handshake succeeded.
    #[must_use]
    pub fn initialized() -> Self {
        Self::new("notifications/initialized", None)
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: String,

    /// The request ID this response corresponds to.
    pub id: RequestId,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// Server-defined error.
    ServerError(i32),
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerError(code) => code,
        }
    }

    /// Maps a numeric code received from a server back to its kind.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            other => Self::ServerError(other),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorCode {
        ErrorCode::from_code(self.code)
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: String,

    /// The request ID this error corresponds to (if known).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            error,
        }
    }

    /// Creates a method not found error response.
    ///
    /// Sent back when the server asks the client for something it does not offer.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }
}

/// A message received from the server.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    /// A successful reply to one of our requests.
    Response(JsonRpcResponse),
    /// A failed reply to one of our requests (or an unattributable error).
    Error(JsonRpcError),
    /// A request from the server expecting a reply from us.
    Request(JsonRpcRequest),
    /// A notification (no response expected).
    Notification(JsonRpcNotification),
}

/// Parses a JSON string into an incoming message.
///
/// # Errors
///
/// Returns a [`ProtocolError`] if the JSON is malformed or not a valid message.
pub fn parse_message(json: &str) -> Result<IncomingMessage, ProtocolError> {
    let value: Value = serde_json::from_str(json).map_err(ProtocolError::InvalidJson)?;

    let obj = value
        .as_object()
        .ok_or(ProtocolError::InvalidMessage("message is not a JSON object"))?;

    let jsonrpc = obj
        .get("jsonrpc")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::InvalidMessage("missing jsonrpc field"))?;

    if jsonrpc != "2.0" {
        return Err(ProtocolError::InvalidMessage("jsonrpc field must be \"2.0\""));
    }

    let has_method = obj.contains_key("method");
    let has_id = obj.get("id").is_some_and(|id| !id.is_null());

    if has_method {
        if has_id {
            let request: JsonRpcRequest = serde_json::from_value(value)
                .map_err(|_| ProtocolError::InvalidMessage("malformed request"))?;
            if let Some(reason) = request.validate() {
                return Err(ProtocolError::InvalidMessage(reason));
            }
            return Ok(IncomingMessage::Request(request));
        }

        let notification: JsonRpcNotification = serde_json::from_value(value)
            .map_err(|_| ProtocolError::InvalidMessage("malformed notification"))?;
        return Ok(IncomingMessage::Notification(notification));
    }

    if obj.contains_key("error") {
        let error: JsonRpcError = serde_json::from_value(value)
            .map_err(|_| ProtocolError::InvalidMessage("malformed error response"))?;
        return Ok(IncomingMessage::Error(error));
    }

    if obj.contains_key("result") && has_id {
        let response: JsonRpcResponse = serde_json::from_value(value)
            .map_err(|_| ProtocolError::InvalidMessage("malformed response"))?;
        return Ok(IncomingMessage::Response(response));
    }

    Err(ProtocolError::InvalidMessage(
        "message is neither a request, a notification nor a response",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success_response() {
        let json = r#"{"jsonrpc": "2.0", "id": 1, "result": {"resources": []}}"#;
        let msg = parse_message(json).unwrap();

        let IncomingMessage::Response(resp) = msg else {
            panic!("Expected Response, got {msg:?}");
        };
        assert_eq!(resp.id, RequestId::Number(1));
        assert_eq!(resp.result, serde_json::json!({"resources": []}));
    }

    #[test]
    fn parse_error_response() {
        let json = r#"{"jsonrpc": "2.0", "id": "abc-123", "error": {"code": -32601, "message": "Method not found"}}"#;
        let msg = parse_message(json).unwrap();

        let IncomingMessage::Error(err) = msg else {
            panic!("Expected Error, got {msg:?}");
        };
        assert_eq!(err.id, Some(RequestId::String("abc-123".to_string())));
        assert_eq!(err.error.kind(), ErrorCode::MethodNotFound);
    }

    #[test]
    fn parse_error_without_id() {
        let json = r#"{"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}}"#;
        let msg = parse_message(json).unwrap();

        let IncomingMessage::Error(err) = msg else {
            panic!("Expected Error, got {msg:?}");
        };
        assert!(err.id.is_none());
        assert_eq!(err.error.kind(), ErrorCode::ParseError);
    }

    #[test]
    fn parse_server_request() {
        let json = r#"{"jsonrpc": "2.0", "id": 7, "method": "ping"}"#;
        let msg = parse_message(json).unwrap();

        let IncomingMessage::Request(req) = msg else {
            panic!("Expected Request, got {msg:?}");
        };
        assert_eq!(req.method, "ping");
    }

    #[test]
    fn parse_notification() {
        let json = r#"{"jsonrpc": "2.0", "method": "notifications/message", "params": {"level": "info"}}"#;
        let msg = parse_message(json).unwrap();
        assert!(matches!(msg, IncomingMessage::Notification(_)));
    }

    #[test]
    fn parse_invalid_json() {
        let err = parse_message("not valid json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn parse_missing_jsonrpc() {
        let err = parse_message(r#"{"id": 1, "result": {}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn parse_wrong_jsonrpc_version() {
        let err = parse_message(r#"{"jsonrpc": "1.0", "id": 1, "result": {}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn reject_empty_method() {
        let err = parse_message(r#"{"jsonrpc": "2.0", "id": 1, "method": ""}"#).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidMessage("method field cannot be empty")
        ));
    }

    #[test]
    fn serialise_request_omits_missing_params() {
        let request = JsonRpcRequest::new(RequestId::Number(3), "ping", None);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#);
    }

    #[test]
    fn serialise_initialized_notification() {
        let json = serde_json::to_string(&JsonRpcNotification::initialized()).unwrap();
        assert_eq!(
            json,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#
        );
    }

    #[test]
    fn serialise_method_not_found_reply() {
        let error = JsonRpcError::method_not_found(RequestId::Number(1), "sampling/createMessage");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""code":-32601"#));
        assert!(json.contains("sampling/createMessage"));
    }

    #[test]
    fn error_code_round_trip() {
        for code in [-32700, -32600, -32601, -32602, -32603, -32000] {
            assert_eq!(ErrorCode::from_code(code).code(), code);
        }
    }

    #[test]
    fn request_id_display() {
        assert_eq!(format!("{}", RequestId::Number(42)), "42");
        assert_eq!(format!("{}", RequestId::String("abc".to_string())), "abc");
    }
}

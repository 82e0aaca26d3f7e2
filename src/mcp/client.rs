//! MCP client over WebSocket.
//!
//! This module implements the client half of the MCP lifecycle:
//!
//! 1. **Initialisation**: `initialize` request, then `notifications/initialized`
//! 2. **Operation**: `resources/list` and `tools/call` requests
//! 3. **Shutdown**: WebSocket close handshake
//!
//! Requests are issued one at a time. Every wait on the server is bounded by
//! the configured timeout; connection attempts that time out or are refused
//! are retried `retry_attempts` more times.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ProtocolError, TransportError};
use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId, CLIENT_NAME, MCP_PROTOCOL_VERSION,
};
use crate::mcp::transport::WebSocketTransport;

/// Pause between two connection attempts.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on `resources/list` pages followed in one call.
const MAX_RESOURCE_PAGES: usize = 100;

/// How long to wait for the server to acknowledge a close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// The remote operations a session needs from its underlying connection.
///
/// [`McpClient`] is the real implementation; tests substitute their own.
#[async_trait]
pub trait Connection: Send {
    /// Establishes the connection to `endpoint`.
    async fn connect(&mut self, endpoint: &str) -> Result<(), ClientError>;

    /// Closes the connection. Closing an unopened connection is a no-op.
    async fn disconnect(&mut self) -> Result<(), ClientError>;

    /// Lists the resources the server exposes.
    async fn list_resources(&mut self) -> Result<Vec<Value>, ClientError>;

    /// Returns the capabilities the server reported about itself.
    async fn get_capabilities(&mut self) -> Result<IndexMap<String, Value>, ClientError>;

    /// Invokes the tool `name` with `arguments`, returning the raw result.
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, ClientError>;
}

/// Settings an [`McpClient`] is constructed with.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Bearer token sent as `Authorization: Bearer <token>`.
    pub auth_token: Option<String>,
    /// Extra headers for the WebSocket upgrade request.
    pub headers: HashMap<String, String>,
    /// Bound on connecting and on each wait for a response.
    pub timeout: Duration,
    /// Additional connection attempts after a timed-out or refused one.
    pub retry_attempts: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auth_token: None,
            headers: HashMap::new(),
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
        }
    }
}

impl ClientOptions {
    /// Headers for the upgrade request, with the bearer header added unless
    /// an `Authorization` header was configured explicitly.
    #[must_use]
    pub fn request_headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();
        if let Some(token) = &self.auth_token {
            let has_authorization = headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("authorization"));
            if !has_authorization {
                headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            }
        }
        headers
    }
}

/// Client information sent during initialisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    /// Implementation name.
    pub name: String,
    /// Implementation version.
    #[serde(default)]
    pub version: Option<String>,
}

impl Implementation {
    fn this_client() -> Self {
        Self {
            name: CLIENT_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    protocol_version: &'static str,
    capabilities: Value,
    client_info: Implementation,
}

/// The server's answer to `initialize`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version the server agreed to.
    pub protocol_version: String,
    /// Capabilities the server advertises.
    #[serde(default)]
    pub capabilities: IndexMap<String, Value>,
    /// Server name and version.
    #[serde(default)]
    pub server_info: Option<Implementation>,
}

/// One page of `resources/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResourcesResult {
    #[serde(default)]
    resources: Vec<Value>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Serialize)]
struct ToolCallParams<'a> {
    name: &'a str,
    arguments: Map<String, Value>,
}

/// An MCP client speaking JSON-RPC over a WebSocket.
pub struct McpClient {
    options: ClientOptions,
    transport: Option<WebSocketTransport>,
    server: Option<InitializeResult>,
    next_id: i64,
}

impl McpClient {
    /// Creates an unconnected client.
    #[must_use]
    pub const fn new(options: ClientOptions) -> Self {
        Self {
            options,
            transport: None,
            server: None,
            next_id: 1,
        }
    }

    /// Checks that `endpoint` is a WebSocket URL.
    fn validate_endpoint(endpoint: &str) -> Result<(), ClientError> {
        let invalid = |reason: String| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(invalid(format!(
                "unsupported scheme '{other}', expected ws or wss"
            ))),
        }
    }

    /// One connection attempt: open the socket and run the handshake.
    async fn try_connect(
        &mut self,
        endpoint: &str,
        headers: &HashMap<String, String>,
    ) -> Result<(), ClientError> {
        let timeout = self.options.timeout;
        let transport = tokio::time::timeout(timeout, WebSocketTransport::connect(endpoint, headers))
            .await
            .map_err(|_| ClientError::Timeout { timeout })?
            .map_err(classify_connect_failure)?;

        self.transport = Some(transport);

        match self.initialize().await {
            Ok(result) => {
                info!(
                    protocol_version = %result.protocol_version,
                    server = ?result.server_info.as_ref().map(|s| &s.name),
                    "MCP session initialised"
                );
                self.server = Some(result);
                Ok(())
            }
            Err(e) => {
                self.transport = None;
                Err(e)
            }
        }
    }

    /// Runs the initialize handshake on a freshly opened transport.
    async fn initialize(&mut self) -> Result<InitializeResult, ClientError> {
        let params = InitializeParams {
            protocol_version: MCP_PROTOCOL_VERSION,
            capabilities: json!({}),
            client_info: Implementation::this_client(),
        };
        let params = serde_json::to_value(params).map_err(TransportError::from)?;

        let result = self.request("initialize", Some(params)).await?;
        let result: InitializeResult = decode("initialize", result)?;

        if result.protocol_version != MCP_PROTOCOL_VERSION {
            warn!(
                requested = MCP_PROTOCOL_VERSION,
                negotiated = %result.protocol_version,
                "server negotiated a different protocol version"
            );
        }

        self.transport_mut()?
            .write_notification(&JsonRpcNotification::initialized())
            .await?;

        Ok(result)
    }

    fn transport_mut(&mut self) -> Result<&mut WebSocketTransport, ClientError> {
        self.transport.as_mut().ok_or(ClientError::NotConnected)
    }

    /// Sends a request and waits for the response with the same id.
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let id = RequestId::Number(self.next_id);
        self.next_id += 1;

        let timeout = self.options.timeout;
        let transport = self.transport_mut()?;

        debug!(%id, method, "sending request");
        transport
            .write_request(&JsonRpcRequest::new(id.clone(), method, params))
            .await?;

        tokio::time::timeout(timeout, Self::await_response(transport, &id))
            .await
            .map_err(|_| ClientError::Timeout { timeout })?
    }

    /// Reads messages until the reply to `id` arrives.
    ///
    /// Notifications are skipped; server requests are answered on the spot.
    async fn await_response(
        transport: &mut WebSocketTransport,
        id: &RequestId,
    ) -> Result<Value, ClientError> {
        loop {
            let Some(line) = transport.read_message().await? else {
                return Err(ClientError::Closed);
            };

            let message = match parse_message(&line) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "ignoring malformed message from server");
                    continue;
                }
            };

            match message {
                IncomingMessage::Response(resp) if resp.id == *id => return Ok(resp.result),
                IncomingMessage::Error(err) if err.id.as_ref() == Some(id) => {
                    debug!(%id, kind = ?err.error.kind(), "request failed");
                    return Err(ClientError::Rpc {
                        code: err.error.code,
                        message: err.error.message,
                    });
                }
                IncomingMessage::Response(resp) => {
                    debug!(id = %resp.id, "ignoring response to an unknown request");
                }
                IncomingMessage::Error(err) => {
                    warn!(
                        kind = ?err.error.kind(),
                        message = %err.error.message,
                        "server reported an unattributed error"
                    );
                }
                IncomingMessage::Notification(notif) => {
                    debug!(method = %notif.method, "server notification");
                }
                IncomingMessage::Request(req) => {
                    Self::answer_server_request(transport, req).await?;
                }
            }
        }
    }

    /// Replies to a request the server sent us.
    async fn answer_server_request(
        transport: &mut WebSocketTransport,
        req: JsonRpcRequest,
    ) -> Result<(), ClientError> {
        debug!(id = %req.id, method = %req.method, "server request");
        if req.method == "ping" {
            transport
                .write_response(&JsonRpcResponse::success(req.id, json!({})))
                .await?;
        } else {
            transport
                .write_error(&JsonRpcError::method_not_found(req.id, &req.method))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for McpClient {
    async fn connect(&mut self, endpoint: &str) -> Result<(), ClientError> {
        Self::validate_endpoint(endpoint)?;

        let headers = self.options.request_headers();
        let attempts = self.options.retry_attempts.saturating_add(1);

        let mut attempt = 1;
        loop {
            debug!(endpoint, attempt, attempts, "connecting");
            match self.try_connect(endpoint, &headers).await {
                Ok(()) => return Ok(()),
                Err(e @ (ClientError::Timeout { .. } | ClientError::Refused(_)))
                    if attempt < attempts =>
                {
                    warn!(error = %e, attempt, "connection attempt failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), ClientError> {
        self.server = None;
        let Some(transport) = self.transport.take() else {
            return Ok(());
        };

        match tokio::time::timeout(CLOSE_TIMEOUT, transport.close()).await {
            Ok(result) => result.map_err(ClientError::from),
            Err(_) => {
                debug!("server did not acknowledge close in time");
                Ok(())
            }
        }
    }

    async fn list_resources(&mut self) -> Result<Vec<Value>, ClientError> {
        let mut resources = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_RESOURCE_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page = self.request("resources/list", params).await?;
            let page: ListResourcesResult = decode("resources/list", page)?;

            resources.extend(page.resources);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(resources),
            }
        }

        warn!(
            pages = MAX_RESOURCE_PAGES,
            "resource listing truncated at page limit"
        );
        Ok(resources)
    }

    async fn get_capabilities(&mut self) -> Result<IndexMap<String, Value>, ClientError> {
        self.transport_mut()?;
        self.server
            .as_ref()
            .map(|server| server.capabilities.clone())
            .ok_or(ClientError::NotConnected)
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, ClientError> {
        let params = serde_json::to_value(ToolCallParams { name, arguments })
            .map_err(TransportError::from)?;
        let result = self.request("tools/call", Some(params)).await?;

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(ClientError::ToolFailed {
                tool: name.to_string(),
                message: text_content(&result),
            });
        }

        Ok(result)
    }
}

/// Sorts a failed WebSocket open into "refused" or "something else".
fn classify_connect_failure(error: TransportError) -> ClientError {
    use tokio_tungstenite::tungstenite::Error as WsError;

    match error {
        TransportError::WebSocket(WsError::Io(_) | WsError::Http(_) | WsError::Tls(_)) => {
            ClientError::Refused(error)
        }
        other => ClientError::Transport(other),
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|source| {
        ClientError::Protocol(ProtocolError::UnexpectedResult {
            method: method.to_string(),
            source,
        })
    })
}

/// Joins the text items of a tool result's `content` array.
fn text_content(result: &Value) -> String {
    let texts: Vec<&str> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if texts.is_empty() {
        "no error details".to_string()
    } else {
        texts.join("\n")
    }
}

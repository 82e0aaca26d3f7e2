//! WebSocket transport for the MCP client.
//!
//! - Each JSON-RPC message travels in its own text frame
//! - Binary frames are accepted if they hold UTF-8 text
//! - Pings are answered, pongs are ignored
//! - Extra HTTP headers (authentication and the like) ride on the upgrade request
//!
//! TLS (`wss://`) is handled by rustls (ring provider) with the webpki root
//! store.

use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::mcp::protocol::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Installs the ring crypto provider unless the process already has one.
fn ensure_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // An Err only means another caller installed a provider first.
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

/// A WebSocket-based MCP transport.
pub struct WebSocketTransport {
    stream: WsStream,
}

impl WebSocketTransport {
    /// Opens a WebSocket connection to `endpoint`, adding `headers` to the
    /// upgrade request.
    ///
    /// # Errors
    ///
    /// Returns an error if a header is invalid or the handshake fails.
    pub async fn connect(
        endpoint: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Self, TransportError> {
        let mut request = endpoint.into_client_request()?;

        for (name, value) in headers {
            let invalid = || TransportError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            request.headers_mut().insert(header_name, header_value);
        }

        ensure_crypto_provider();
        let (stream, response) = connect_async(request).await?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        Ok(Self { stream })
    }

    /// Reads the next text message.
    ///
    /// Returns `None` once the server has closed the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket fails or a binary frame is not UTF-8.
    pub async fn read_message(&mut self) -> Result<Option<String>, TransportError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => {
                    trace!(message = %text, "received");
                    return Ok(Some(text));
                }
                Message::Binary(data) => {
                    let text = String::from_utf8(data).map_err(|_| TransportError::NonUtf8Frame)?;
                    trace!(message = %text, "received (binary frame)");
                    return Ok(Some(text));
                }
                Message::Ping(data) => {
                    self.stream.send(Message::Pong(data)).await?;
                }
                Message::Close(frame) => {
                    debug!(?frame, "server closed the connection");
                    return Ok(None);
                }
                Message::Pong(_) | Message::Frame(_) => {}
            }
        }

        Ok(None)
    }

    /// Writes a JSON-RPC request.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_request(&mut self, request: &JsonRpcRequest) -> Result<(), TransportError> {
        self.write_json(request).await
    }

    /// Writes a JSON-RPC notification.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_notification(
        &mut self,
        notification: &JsonRpcNotification,
    ) -> Result<(), TransportError> {
        self.write_json(notification).await
    }

    /// Writes a JSON-RPC response to a server-initiated request.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_response(
        &mut self,
        response: &JsonRpcResponse,
    ) -> Result<(), TransportError> {
        self.write_json(response).await
    }

    /// Writes a JSON-RPC error to a server-initiated request.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_error(&mut self, error: &JsonRpcError) -> Result<(), TransportError> {
        self.write_json(error).await
    }

    async fn write_json<T: Serialize + Sync>(&mut self, message: &T) -> Result<(), TransportError> {
        let json = serde_json::to_string(message)?;
        trace!(message = %json, "sending");
        self.stream.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Sends a close frame and waits for the server to acknowledge it.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails.
    pub async fn close(mut self) -> Result<(), TransportError> {
        self.stream.close(None).await?;

        // Drain until the server's close frame arrives or the stream ends.
        while let Some(frame) = self.stream.next().await {
            if frame.is_err() {
                break;
            }
        }

        Ok(())
    }
}

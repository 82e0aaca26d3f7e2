//! The remote session façade.
//!
//! A [`RemoteSession`] owns at most one underlying [`Connection`] and moves
//! through a single straight line:
//!
//! ```text
//! unconnected ──connect──▶ connected ──disconnect──▶ unconnected
//!                              │
//!                              └─ list_resources / get_capabilities / call_tool
//! ```
//!
//! Timeouts and retries belong to the underlying connection; this layer only
//! forwards calls and sorts failures into [`ConnectError`] and
//! [`OperationError`].

use std::collections::HashMap;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{ConnectError, OperationError};
use crate::mcp::client::{ClientOptions, Connection, McpClient};

/// Resources as returned by the server, in order.
pub type ResourceList = Vec<Value>;

/// Capability name to capability value, in the order the server reported them.
pub type CapabilityMap = IndexMap<String, Value>;

/// Whatever a remote tool returned.
pub type ToolResponse = Value;

/// Builds the underlying connection for a session.
pub type Connector = Box<dyn Fn(&ConnectionConfig) -> Box<dyn Connection> + Send + Sync>;

/// Default timeout for connecting and for each request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of additional connection attempts.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Everything needed to reach the server. Immutable once built.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    endpoint: String,
    auth_token: Option<String>,
    headers: HashMap<String, String>,
    timeout: Duration,
    retry_attempts: u32,
}

impl ConnectionConfig {
    /// Creates a configuration for `endpoint` with default timeout and retries.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_token: None,
            headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    /// Adds extra headers, replacing any with the same name.
    ///
    /// Names compare case-insensitively; the latest spelling is kept.
    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        for (name, value) in headers {
            self.headers
                .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of additional connection attempts.
    #[must_use]
    pub const fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    /// The server endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Extra headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Connect and request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Additional connection attempts.
    #[must_use]
    pub const fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }
}

impl From<&ConnectionConfig> for ClientOptions {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            auth_token: config.auth_token.clone(),
            headers: config.headers.clone(),
            timeout: config.timeout,
            retry_attempts: config.retry_attempts,
        }
    }
}

/// One session with one remote server.
pub struct RemoteSession {
    config: ConnectionConfig,
    connector: Connector,
    connection: Option<Box<dyn Connection>>,
}

impl RemoteSession {
    /// Creates an unconnected session backed by an [`McpClient`].
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(
            config,
            Box::new(|config: &ConnectionConfig| -> Box<dyn Connection> {
                Box::new(McpClient::new(ClientOptions::from(config)))
            }),
        )
    }

    /// Creates an unconnected session whose connection is built by `connector`.
    #[must_use]
    pub fn with_connector(config: ConnectionConfig, connector: Connector) -> Self {
        Self {
            config,
            connector,
            connection: None,
        }
    }

    /// The configuration this session connects with.
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether a live connection is held.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Builds the underlying connection and connects it to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::AlreadyConnected`] if a connection is already
    /// held, otherwise the underlying failure sorted into timeout, refused or
    /// unexpected.
    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        if self.connection.is_some() {
            return Err(ConnectError::AlreadyConnected);
        }

        let mut connection = (self.connector)(&self.config);
        connection.connect(self.config.endpoint()).await?;

        info!(endpoint = %self.config.endpoint(), "connected");
        self.connection = Some(connection);
        Ok(())
    }

    /// Closes the connection if one is held.
    ///
    /// Never fails: a close error is logged and the handle is dropped anyway.
    pub async fn disconnect(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            debug!("disconnect without a connection");
            return;
        };

        match connection.disconnect().await {
            Ok(()) => info!("disconnected"),
            Err(e) => warn!(error = %e, "error while disconnecting"),
        }
    }

    fn connection(&mut self) -> Result<&mut (dyn Connection + 'static), OperationError> {
        self.connection
            .as_deref_mut()
            .ok_or(OperationError::NotConnected)
    }

    /// Lists the server's resources.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotConnected`] without a connection, or
    /// [`OperationError::Failed`] if the server call fails.
    pub async fn list_resources(&mut self) -> Result<ResourceList, OperationError> {
        self.connection()?
            .list_resources()
            .await
            .map_err(|cause| OperationError::Failed {
                operation: "list_resources".to_string(),
                cause,
            })
    }

    /// Returns the server's capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotConnected`] without a connection, or
    /// [`OperationError::Failed`] if the server call fails.
    pub async fn get_capabilities(&mut self) -> Result<CapabilityMap, OperationError> {
        self.connection()?
            .get_capabilities()
            .await
            .map_err(|cause| OperationError::Failed {
                operation: "get_capabilities".to_string(),
                cause,
            })
    }

    /// Invokes the remote tool `name`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotConnected`] without a connection, or
    /// [`OperationError::Failed`] named after the tool if the call fails.
    pub async fn call_tool(
        &mut self,
        name: &str,
        args: Map<String, Value>,
    ) -> Result<ToolResponse, OperationError> {
        self.connection()?
            .call_tool(name, args)
            .await
            .map_err(|cause| OperationError::Failed {
                operation: name.to_string(),
                cause,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ConnectionConfig::new("ws://localhost:8080");
        assert_eq!(config.endpoint(), "ws://localhost:8080");
        assert_eq!(config.auth_token(), None);
        assert!(config.headers().is_empty());
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.retry_attempts(), DEFAULT_RETRY_ATTEMPTS);
    }

    #[test]
    fn client_options_mirror_config() {
        let config = ConnectionConfig::new("ws://localhost:8080")
            .with_auth_token(Some("token".to_string()))
            .with_headers([("X-Client".to_string(), "demo".to_string())])
            .with_timeout(Duration::from_secs(5))
            .with_retry_attempts(0);

        let options = ClientOptions::from(&config);
        assert_eq!(options.auth_token.as_deref(), Some("token"));
        assert_eq!(options.headers.get("X-Client").unwrap(), "demo");
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.retry_attempts, 0);
    }

    #[test]
    fn later_headers_override_regardless_of_case() {
        let config = ConnectionConfig::new("ws://localhost:8080")
            .with_headers([
                ("X-Client".to_string(), "from-file".to_string()),
                ("X-Other".to_string(), "kept".to_string()),
            ])
            .with_headers([("x-client".to_string(), "from-flag".to_string())]);

        assert_eq!(config.headers().len(), 2);
        assert_eq!(config.headers().get("x-client").unwrap(), "from-flag");
        assert!(!config.headers().contains_key("X-Client"));
        assert_eq!(config.headers().get("X-Other").unwrap(), "kept");
    }

    #[tokio::test]
    async fn fresh_session_is_unconnected() {
        let mut session = RemoteSession::new(ConnectionConfig::new("ws://localhost:8080"));
        assert!(!session.is_connected());
        assert!(matches!(
            session.list_resources().await,
            Err(OperationError::NotConnected)
        ));
        session.disconnect().await;
        session.disconnect().await;
        assert!(!session.is_connected());
    }
}

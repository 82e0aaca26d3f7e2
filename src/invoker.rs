//! Word-counter invocation with local fallback.
//!
//! [`ToolInvoker::run`] always produces a result. When the remote
//! `word_counter` call fails for any reason, including a missing connection,
//! the count is computed locally and tagged as such. The remote error is
//! logged at `warn`, never returned.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::OperationError;
use crate::session::{RemoteSession, ToolResponse};

/// Name of the remote tool.
pub const WORD_COUNTER_TOOL: &str = "word_counter";

/// Note attached to locally computed results.
pub const LOCAL_FALLBACK_NOTE: &str = "Calculated locally - server tool not available";

/// Outcome of a word-counter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolResult {
    /// What the remote tool returned, untouched.
    Remote(ToolResponse),

    /// Computed on this side because the remote tool could not be used.
    LocalFallback {
        /// Whitespace-delimited tokens in the input.
        word_count: usize,
        /// Characters (not bytes) in the input.
        character_count: usize,
        /// Marks the result as locally computed.
        note: &'static str,
    },
}

impl ToolResult {
    /// Counts `text` locally.
    #[must_use]
    pub fn local(text: &str) -> Self {
        Self::LocalFallback {
            word_count: text.split_whitespace().count(),
            character_count: text.chars().count(),
            note: LOCAL_FALLBACK_NOTE,
        }
    }

    /// Whether the result came from the server.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Runs the word counter against a session.
pub struct ToolInvoker<'a> {
    session: &'a mut RemoteSession,
}

impl<'a> ToolInvoker<'a> {
    /// Creates an invoker borrowing `session`.
    #[must_use]
    pub fn new(session: &'a mut RemoteSession) -> Self {
        Self { session }
    }

    /// Counts the words in `text`, remotely if possible.
    pub async fn run(&mut self, text: &str) -> ToolResult {
        let mut args = Map::new();
        args.insert("text".to_string(), Value::String(text.to_string()));

        match self.session.call_tool(WORD_COUNTER_TOOL, args).await {
            Ok(response) => {
                debug!("word counter answered remotely");
                ToolResult::Remote(response)
            }
            Err(e) => {
                log_fallback(&e);
                ToolResult::local(text)
            }
        }
    }
}

fn log_fallback(error: &OperationError) {
    match error {
        OperationError::NotConnected => {
            warn!("no connection, counting words locally");
        }
        OperationError::Failed { cause, .. } => {
            warn!(
                error = %cause,
                tool = WORD_COUNTER_TOOL,
                "remote tool failed, counting words locally"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConnectionConfig;

    #[test]
    fn local_counts_words_and_characters() {
        assert_eq!(
            ToolResult::local("hello world"),
            ToolResult::LocalFallback {
                word_count: 2,
                character_count: 11,
                note: LOCAL_FALLBACK_NOTE,
            }
        );
    }

    #[test]
    fn local_handles_empty_and_padded_text() {
        let ToolResult::LocalFallback { word_count, character_count, .. } = ToolResult::local("")
        else {
            panic!("expected local result");
        };
        assert_eq!((word_count, character_count), (0, 0));

        let ToolResult::LocalFallback { word_count, .. } = ToolResult::local("  a   b  ") else {
            panic!("expected local result");
        };
        assert_eq!(word_count, 2);

        let ToolResult::LocalFallback { word_count, .. } = ToolResult::local("one\ttwo\nthree")
        else {
            panic!("expected local result");
        };
        assert_eq!(word_count, 3);
    }

    #[test]
    fn character_count_is_not_byte_count() {
        let ToolResult::LocalFallback { character_count, .. } = ToolResult::local("héllo wörld")
        else {
            panic!("expected local result");
        };
        assert_eq!(character_count, 11);
    }

    #[test]
    fn fallback_serialises_flat() {
        let json = serde_json::to_value(ToolResult::local("a b")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "word_count": 2,
                "character_count": 3,
                "note": LOCAL_FALLBACK_NOTE
            })
        );
    }

    #[test]
    fn remote_displays_response_verbatim() {
        let result = ToolResult::Remote(serde_json::json!({"content": []}));
        assert!(result.is_remote());
        assert_eq!(result.to_string(), "{\n  \"content\": []\n}");
    }

    #[tokio::test]
    async fn run_without_connection_falls_back() {
        let mut session = RemoteSession::new(ConnectionConfig::new("ws://localhost:8080"));
        let result = ToolInvoker::new(&mut session).run("hello world").await;
        assert_eq!(result, ToolResult::local("hello world"));
    }
}

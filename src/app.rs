//! The demo walkthrough the binary runs.
//!
//! Connect, list resources, list capabilities, count words, and always
//! disconnect afterwards, whether the walkthrough finished, failed or was
//! interrupted.

use std::future::Future;
use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::display::{format_capabilities, format_resources, report_error};
use crate::error::RunError;
use crate::invoker::ToolInvoker;
use crate::session::RemoteSession;

/// Prompt shown when no text was given on the command line.
pub const TEXT_PROMPT: &str = "Enter text to count words (or Ctrl+C to quit): ";

/// Runs the walkthrough, reports any error, then disconnects.
///
/// `shutdown` resolving stops the walkthrough early; disconnect still runs.
/// Errors are printed to `out` and never returned: the process exit status
/// does not depend on remote failures.
pub async fn run<R, W, S>(
    session: &mut RemoteSession,
    text: Option<String>,
    input: &mut R,
    out: &mut W,
    shutdown: S,
) where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    let outcome = tokio::select! {
        result = walkthrough(&mut *session, text, input, &mut *out) => result,
        () = shutdown => {
            info!("interrupted, disconnecting");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        warn!(error = %e, "walkthrough failed");
        if let Err(io) = report_error(&mut *out, &e) {
            warn!(error = %io, "could not print error");
        }
    }

    session.disconnect().await;
    if let Err(e) = writeln!(out, "\nDisconnected from MCP server.") {
        warn!(error = %e, "could not write to console");
    }
}

/// The steps between connecting and disconnecting.
///
/// # Errors
///
/// Returns the first connect, operation or console error.
pub async fn walkthrough<R, W>(
    session: &mut RemoteSession,
    text: Option<String>,
    input: &mut R,
    out: &mut W,
) -> Result<(), RunError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    session.connect().await?;
    writeln!(out, "Connected to MCP server.")?;

    let resources = session.list_resources().await?;
    writeln!(out, "\nAvailable Resources:")?;
    writeln!(out, "{}", format_resources(&resources))?;

    let capabilities = session.get_capabilities().await?;
    writeln!(out, "\nServer Capabilities:")?;
    writeln!(out, "{}", format_capabilities(&capabilities))?;

    let text = match text.filter(|t| !t.is_empty()) {
        Some(text) => text,
        None => prompt_for_text(input, out).await?,
    };

    writeln!(out, "\nRunning word counter tool...")?;
    let result = ToolInvoker::new(session).run(&text).await;
    info!(remote = result.is_remote(), "word counter finished");

    writeln!(out, "\nWord Counter Result:")?;
    writeln!(out, "{result}")?;
    Ok(())
}

/// Asks for one line of text. End of input yields an empty string.
async fn prompt_for_text<R, W>(input: &mut R, out: &mut W) -> std::io::Result<String>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "\n{TEXT_PROMPT}")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

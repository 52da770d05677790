//! Tool host client: discovery and invocation over any [`Transport`].

use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol::{CallToolParams, CallToolResult, JsonRpcError, ListToolsResult, Tool};
use crate::protocol::INTERNAL_ERROR;
use crate::transport::{HandshakeInfo, Transport, TransportKind};

/// How the client treats degenerate host responses.
///
/// The hosts this client grew up against sometimes return shapes the
/// protocol doesn't promise. `Lenient` keeps the conversation going by
/// degrading to "no tools" / empty text; `Strict` surfaces every anomaly.
/// Tests assert both deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Leniency {
    #[default]
    Lenient,
    Strict,
}

/// A connected tool host, behind one of the two transports.
pub struct Client {
    transport: Transport,
    leniency: Leniency,
}

impl Client {
    /// Wrap a transport with the default lenient policy.
    pub fn new(transport: Transport) -> Self {
        Self::with_leniency(transport, Leniency::Lenient)
    }

    pub fn with_leniency(transport: Transport, leniency: Leniency) -> Self {
        Self {
            transport,
            leniency,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    /// Initialize the underlying channel.
    pub async fn handshake(&self) -> Result<HandshakeInfo> {
        self.transport.handshake().await
    }

    /// Release the underlying channel. Idempotent.
    pub async fn close(&self) {
        self.transport.close().await;
    }

    /// Fetch the host's tool descriptors.
    ///
    /// Under [`Leniency::Lenient`] any failure (transport or remote) degrades
    /// to an empty list so the conversation proceeds with no tools available.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let outcome = self
            .transport
            .send_request("tools/list", serde_json::json!({}))
            .await
            .and_then(parse_tools);

        match (outcome, self.leniency) {
            (Ok(tools), _) => Ok(tools),
            (Err(e), Leniency::Lenient) => {
                tracing::warn!(error = %e, "tools/list failed, continuing with no tools");
                Ok(Vec::new())
            }
            (Err(e), Leniency::Strict) => Err(e),
        }
    }

    /// Invoke one tool and return its text output.
    ///
    /// A remote error payload fails with [`Error::ToolCall`]. A success
    /// response missing the expected text content yields an empty string
    /// under [`Leniency::Lenient`], an invalid-response error under
    /// [`Leniency::Strict`].
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let value = self
            .transport
            .send_request("tools/call", serde_json::to_value(params)?)
            .await
            .map_err(|e| match e {
                Error::Rpc(remote) => Error::ToolCall(remote),
                other => other,
            })?;

        extract_text(value, self.leniency)
    }
}

fn parse_tools(value: Value) -> Result<Vec<Tool>> {
    let listing: ListToolsResult = serde_json::from_value(value)?;
    Ok(listing.tools)
}

fn extract_text(value: Value, leniency: Leniency) -> Result<String> {
    let degrade = |reason: &str| match leniency {
        Leniency::Lenient => {
            tracing::warn!(reason, "tools/call result had no text content, returning empty");
            Ok(String::new())
        }
        Leniency::Strict => Err(Error::InvalidResponse(format!(
            "tools/call result had no text content: {reason}"
        ))),
    };

    let result: CallToolResult = match serde_json::from_value(value) {
        Ok(result) => result,
        Err(e) => return degrade(&e.to_string()),
    };

    if result.is_error {
        let message = result
            .content
            .iter()
            .filter_map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("\n");
        return Err(Error::ToolCall(JsonRpcError {
            code: INTERNAL_ERROR,
            message,
            data: None,
        }));
    }

    match result.content.first().and_then(|c| c.as_text()) {
        Some(text) => Ok(text.to_string()),
        None => degrade("first content item carries no text"),
    }
}

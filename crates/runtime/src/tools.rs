//! The tool-host seam between the orchestration loop and side effects.

use crate::model::{ToolCall, ToolSpec};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Errors crossing the tool-host boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ToolError {
    /// The remote tool ran and reported failure.
    #[error("tool call failed: {0}")]
    Call(String),
    /// The channel to the host broke mid-call.
    #[error("tool transport: {0}")]
    Transport(String),
}

/// Trait for tool execution hosts.
///
/// This is the boundary between the conversation loop and the outside world;
/// the loop only ever discovers descriptors and exchanges one invocation for
/// one text result.
pub trait ToolHost: Send + Sync {
    /// Fetch the currently advertised tool descriptors.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolSpec>, ToolError>> + Send;

    /// Execute one invocation and return its text output.
    fn call_tool(&self, call: &ToolCall) -> impl Future<Output = Result<String, ToolError>> + Send;
}

impl From<mcp::Tool> for ToolSpec {
    fn from(tool: mcp::Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            input_schema: tool.input_schema,
        }
    }
}

impl ToolHost for mcp::Client {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        let tools = mcp::Client::list_tools(self)
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        Ok(tools.into_iter().map(ToolSpec::from).collect())
    }

    async fn call_tool(&self, call: &ToolCall) -> Result<String, ToolError> {
        mcp::Client::call_tool(self, &call.name, call.input.clone())
            .await
            .map_err(|e| match e {
                mcp::Error::ToolCall(remote) => ToolError::Call(remote.to_string()),
                other => ToolError::Transport(other.to_string()),
            })
    }
}

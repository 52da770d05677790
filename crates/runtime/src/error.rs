use crate::model::ModelError;
use crate::tools::ToolError;
use thiserror::Error;

/// Orchestration-level failures, surfaced at the chat boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// `process_query` was entered while the tool host is not connected.
    #[error("tool host not connected")]
    NotConnected,

    /// A tool invocation failed; the turn is aborted, not retried.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The LLM provider call failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, Error>;

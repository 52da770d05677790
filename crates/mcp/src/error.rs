//! Error taxonomy for the tool-host bridge.
//!
//! Four classes, surfaced at different layers:
//!
//! - [`Error::Validation`]: rejected before any resource is acquired.
//! - [`Error::Connection`]: handshake failure; the lifecycle manager turns
//!   this into `connected = false` instead of propagating.
//! - Transport-class variants (`Io`, `Http`, `Timeout`, `HostExited`,
//!   `Serialize`, `InvalidResponse`, `Rpc`): mid-session request failures,
//!   propagated to the caller of the failing operation.
//! - [`Error::ToolCall`]: the remote tool itself failed; carries the remote
//!   error payload.

use crate::protocol::JsonRpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation: {0}")]
    Validation(String),

    #[error("connection: {0}")]
    Connection(String),

    #[error("transport io: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport http: {0}")]
    Http(reqwest::Error),

    #[error("timeout waiting for tool host")]
    Timeout,

    #[error("tool host exited unexpectedly")]
    HostExited,

    #[error("failed to encode or decode message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("tool host error: {0}")]
    Rpc(#[from] JsonRpcError),

    #[error("tool call failed: {0}")]
    ToolCall(JsonRpcError),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

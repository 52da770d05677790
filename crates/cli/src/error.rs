//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No tool host was configured for a command that needs one.
    #[error("no tool host configured: pass --stdio <script> or --http <url>")]
    NoToolHost,

    /// An error occurred in the tool-host client layer.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    /// Building an HTTP client failed.
    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

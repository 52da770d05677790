//! tether runtime — conversation orchestration over a tool host bridge.
//!
//! The runtime is organized around these concepts:
//!
//! - **Bridge**: one LLM backend plus one tool host connection; runs the
//!   per-turn conversation state machine.
//! - **Backend**: a trait abstracting LLM providers (Anthropic shipped).
//! - **ToolHost**: the seam between the conversation loop and tool
//!   execution, implemented by the `mcp` client.
//! - **ConnectionManager**: establishes the tool host client, tracks the
//!   connected flag, releases the transport on shutdown.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{AnthropicBackend, Bridge, ConnectionManager};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = AnthropicBackend::builder("sk-ant-api01-...", "claude-3-5-sonnet-20241022")
//!     .max_tokens(1000)
//!     .build();
//!
//! let mut manager = ConnectionManager::new();
//! manager.connect_stdio("./crm_host.py").await;
//!
//! let mut bridge = Bridge::new(backend, manager);
//! let answer = bridge.process_query("who is contact 42?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod error;
mod lifecycle;
pub mod model;
mod orchestrator;
mod providers;
mod tools;

pub use error::{Error, Result};
pub use lifecycle::{ConnectionManager, ConnectionState};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolResult,
    ToolSpec, Usage,
};
pub use orchestrator::Bridge;
pub use providers::{AnthropicBackend, AnthropicBackendBuilder};
pub use tools::{ToolError, ToolHost};

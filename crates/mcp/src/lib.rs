//! Tool-host protocol client.
//!
//! This crate normalizes tool discovery and invocation across two transports
//! behind one contract: a locally spawned subprocess speaking newline-framed
//! JSON-RPC over its standard streams, or a remote endpoint answering one
//! POST per logical call.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Client, StdioTransport, Transport};
//!
//! # async fn example() -> mcp::Result<()> {
//! let transport = Transport::Stdio(StdioTransport::new("./crm_host.py")?);
//! let client = Client::new(transport);
//!
//! let info = client.handshake().await?;
//! println!("connected to {}", info.server_name);
//!
//! for tool in client.list_tools().await? {
//!     println!("tool: {}", tool.name);
//! }
//!
//! let details = client
//!     .call_tool("get_contact_details", serde_json::json!({"contact_id": "42"}))
//!     .await?;
//! println!("{details}");
//!
//! client.close().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod protocol;
mod transport;

pub use client::{Client, Leniency};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, RequestId, ServerInfo, Tool, ToolContent,
};
pub use transport::{
    HandshakeInfo, HttpTransport, StdioTransport, Transport, TransportKind, HTTP_TIMEOUT,
    MAX_FRAME_SIZE,
};

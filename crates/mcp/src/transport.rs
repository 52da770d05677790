//! The two transport variants behind one contract.
//!
//! A [`Transport`] carries exactly three things for the layers above it:
//! `handshake`, `send_request`, and `close`. The stdio variant spawns an
//! interpreter for a local tool-host script and frames JSON-RPC messages as
//! newline-delimited JSON over the child's standard streams. The HTTP variant
//! issues one POST per logical call against a fixed endpoint, with no session
//! state beyond the URL.
//!
//! Selection happens at construction; there is no trait object involved.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::protocol::{InitializeParams, InitializeResult, JsonRpcRequest, JsonRpcResponse, RequestId};

/// Fixed timeout applied to every HTTP request/response exchange.
pub const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Maximum accepted size of one framed stdio response (1MB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Which transport variant backs a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    Http,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// What the host told us during initialization.
#[derive(Debug, Clone)]
pub struct HandshakeInfo {
    pub protocol_version: String,
    pub server_name: String,
    pub server_version: Option<String>,
}

impl From<InitializeResult> for HandshakeInfo {
    fn from(init: InitializeResult) -> Self {
        Self {
            protocol_version: init.protocol_version,
            server_name: init.server_info.name,
            server_version: init.server_info.version,
        }
    }
}

/// A connection to a tool host, over one of the two supported channels.
pub enum Transport {
    Stdio(StdioTransport),
    Http(HttpTransport),
}

impl Transport {
    /// Initialize the underlying channel. Must succeed before any other
    /// operation is attempted. Failures are connection-class errors.
    pub async fn handshake(&self) -> Result<HandshakeInfo> {
        match self {
            Self::Stdio(t) => t.handshake().await,
            Self::Http(t) => t.handshake().await,
        }
    }

    /// One logical request/response exchange.
    pub async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        match self {
            Self::Stdio(t) => t.send_request(method, params).await,
            Self::Http(t) => t.send_request(method, params).await,
        }
    }

    /// Release underlying resources. Idempotent.
    pub async fn close(&self) {
        match self {
            Self::Stdio(t) => t.close().await,
            Self::Http(t) => t.close(),
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Stdio(_) => TransportKind::Stdio,
            Self::Http(_) => TransportKind::Http,
        }
    }

    /// Human-readable description of what this transport points at.
    pub fn endpoint(&self) -> String {
        match self {
            Self::Stdio(t) => t.script.display().to_string(),
            Self::Http(t) => t.url.to_string(),
        }
    }
}

// --- Stdio variant ---

/// Interpreter families recognized for tool-host scripts.
const INTERPRETERS: &[(&str, &str)] = &[("py", "python"), ("js", "node")];

struct ChildChannel {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Transport over a spawned subprocess's standard streams.
///
/// Construction only validates the script; the process is spawned during
/// [`StdioTransport::handshake`]. Reads carry no explicit timeout: the child
/// is local and its lifetime is bound to ours via `kill_on_drop`.
pub struct StdioTransport {
    interpreter: &'static str,
    script: PathBuf,
    channel: Mutex<Option<ChildChannel>>,
    next_id: AtomicI64,
}

impl StdioTransport {
    /// Validate the script path and build an unstarted transport.
    ///
    /// Only scripts whose extension maps to a known interpreter family are
    /// accepted; anything else is rejected here, before any process exists.
    pub fn new(script: impl AsRef<Path>) -> Result<Self> {
        let script = script.as_ref().to_path_buf();
        let ext = script
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let interpreter = INTERPRETERS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, interpreter)| *interpreter)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "tool host script must be a .py or .js file, got {}",
                    script.display()
                ))
            })?;

        Ok(Self {
            interpreter,
            script,
            channel: Mutex::new(None),
            next_id: AtomicI64::new(1),
        })
    }

    /// The interpreter this transport would launch.
    pub fn interpreter(&self) -> &'static str {
        self.interpreter
    }

    async fn handshake(&self) -> Result<HandshakeInfo> {
        self.spawn()
            .await
            .map_err(|e| Error::Connection(format!("spawn {}: {e}", self.script.display())))?;

        let value = self
            .send_request("initialize", serde_json::to_value(InitializeParams::default())?)
            .await
            .map_err(|e| Error::Connection(format!("initialize: {e}")))?;
        let init: InitializeResult = serde_json::from_value(value)
            .map_err(|e| Error::Connection(format!("initialize result: {e}")))?;

        self.notify("notifications/initialized")
            .await
            .map_err(|e| Error::Connection(format!("initialized notification: {e}")))?;

        Ok(init.into())
    }

    async fn spawn(&self) -> Result<()> {
        let mut child = Command::new(self.interpreter)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Io(std::io::Error::other("failed to capture stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Io(std::io::Error::other("failed to capture stdout")))?;

        *self.channel.lock().await = Some(ChildChannel {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });

        Ok(())
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = JsonRpcRequest::new(id.clone(), method, params);
        let line = serde_json::to_string(&request)?;

        let mut guard = self.channel.lock().await;
        let channel = guard.as_mut().ok_or(Error::HostExited)?;

        channel.stdin.write_all(line.as_bytes()).await?;
        channel.stdin.write_all(b"\n").await?;
        channel.stdin.flush().await?;

        let mut reply = String::new();
        let read = channel.stdout.read_line(&mut reply).await?;
        if read == 0 {
            return Err(Error::HostExited);
        }
        if reply.len() > MAX_FRAME_SIZE {
            return Err(Error::InvalidResponse(format!(
                "frame of {} bytes exceeds {MAX_FRAME_SIZE}",
                reply.len()
            )));
        }

        let response: JsonRpcResponse = serde_json::from_str(&reply)?;
        if response.id != id {
            return Err(Error::InvalidResponse(format!(
                "response id mismatch: expected {id:?}, got {:?}",
                response.id
            )));
        }

        Ok(response.into_result()?)
    }

    /// Fire-and-forget notification (no id, no response expected).
    async fn notify(&self, method: &str) -> Result<()> {
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
        });
        let line = serde_json::to_string(&notification)?;

        let mut guard = self.channel.lock().await;
        let channel = guard.as_mut().ok_or(Error::HostExited)?;
        channel.stdin.write_all(line.as_bytes()).await?;
        channel.stdin.write_all(b"\n").await?;
        channel.stdin.flush().await?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(mut channel) = self.channel.lock().await.take() {
            let _ = channel.child.kill().await;
        }
    }
}

// --- HTTP variant ---

/// Transport over individual POST requests to a fixed endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    url: reqwest::Url,
    next_id: AtomicI64,
    closed: AtomicBool,
}

impl HttpTransport {
    /// Build a transport for the given endpoint URL.
    pub fn new(url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::Validation(format!("tool host url {url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            client,
            url,
            next_id: AtomicI64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    async fn handshake(&self) -> Result<HandshakeInfo> {
        let value = self
            .send_request("initialize", serde_json::json!({}))
            .await
            .map_err(|e| Error::Connection(format!("initialize: {e}")))?;
        let init: InitializeResult = serde_json::from_value(value)
            .map_err(|e| Error::Connection(format!("initialize result: {e}")))?;
        Ok(init.into())
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::HostExited);
        }

        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = JsonRpcRequest::new(id.clone(), method, params);

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::InvalidResponse(format!(
                "tool host returned {status}"
            )));
        }

        let response: JsonRpcResponse = response.json().await?;
        if response.id != id {
            return Err(Error::InvalidResponse(format!(
                "response id mismatch: expected {id:?}, got {:?}",
                response.id
            )));
        }

        Ok(response.into_result()?)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_script_selects_python() {
        let t = StdioTransport::new("host/tools.py").unwrap();
        assert_eq!(t.interpreter(), "python");
    }

    #[test]
    fn javascript_script_selects_node() {
        let t = StdioTransport::new("host/tools.js").unwrap();
        assert_eq!(t.interpreter(), "node");
    }

    #[test]
    fn unknown_extension_is_rejected_before_spawn() {
        for script in ["tools.sh", "tools.rb", "tools", "tools.pyc"] {
            let err = StdioTransport::new(script).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{script}: {err}");
        }
    }

    #[tokio::test]
    async fn stdio_request_before_handshake_fails() {
        let t = StdioTransport::new("host/tools.py").unwrap();
        let err = t
            .send_request("tools/list", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HostExited));
    }

    #[tokio::test]
    async fn stdio_close_is_idempotent() {
        let t = StdioTransport::new("host/tools.py").unwrap();
        t.close().await;
        t.close().await;
    }

    #[test]
    fn bad_url_is_rejected() {
        let err = HttpTransport::new("not a url").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn http_request_after_close_fails() {
        let t = HttpTransport::new("http://127.0.0.1:1/mcp").unwrap();
        t.close();
        t.close();
        let err = t
            .send_request("tools/list", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HostExited));
    }

    #[test]
    fn transport_reports_kind_and_endpoint() {
        let t = Transport::Http(HttpTransport::new("http://localhost:8001/mcp").unwrap());
        assert_eq!(t.kind(), TransportKind::Http);
        assert_eq!(t.endpoint(), "http://localhost:8001/mcp");

        let t = Transport::Stdio(StdioTransport::new("crm.py").unwrap());
        assert_eq!(t.kind(), TransportKind::Stdio);
        assert_eq!(t.endpoint(), "crm.py");
    }
}

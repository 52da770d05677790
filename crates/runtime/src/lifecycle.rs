//! Connection lifecycle: establish the tool host client, track its status,
//! release it on shutdown.
//!
//! Connection failures never propagate out of this module; the bridge starts
//! in a degraded, reportable state instead of crashing. There is no reconnect
//! logic: once shut down, a manager stays down.

use std::path::Path;

use mcp::{Client, HttpTransport, StdioTransport, Transport, TransportKind};
use serde::Serialize;

/// Where the bridge stands with its tool host.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionState {
    pub kind: Option<TransportKind>,
    pub connected: bool,
    pub endpoint: Option<String>,
}

/// Owns the one tool host client a bridge instance is allowed to have.
#[derive(Default)]
pub struct ConnectionManager {
    client: Option<Client>,
    state: ConnectionState,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    pub(crate) fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    /// Spawn a tool host script and connect over its standard streams.
    ///
    /// Validates the script extension before any process exists, performs the
    /// handshake, then lists tools once so a broken host surfaces now rather
    /// than mid-conversation (the listing itself is discarded).
    pub async fn connect_stdio(&mut self, script: impl AsRef<Path>) -> bool {
        let script = script.as_ref();
        let transport = match StdioTransport::new(script) {
            Ok(t) => Transport::Stdio(t),
            Err(e) => {
                tracing::error!(script = %script.display(), error = %e, "tool host script rejected");
                self.state.connected = false;
                return false;
            }
        };
        self.establish(transport, true).await
    }

    /// Connect to a tool host over HTTP with one initialize exchange.
    pub async fn connect_http(&mut self, url: &str) -> bool {
        let transport = match HttpTransport::new(url) {
            Ok(t) => Transport::Http(t),
            Err(e) => {
                tracing::error!(url, error = %e, "tool host url rejected");
                self.state.connected = false;
                return false;
            }
        };
        self.establish(transport, false).await
    }

    async fn establish(&mut self, transport: Transport, probe_tools: bool) -> bool {
        let kind = transport.kind();
        let endpoint = transport.endpoint();
        let client = Client::new(transport);

        let info = match client.handshake().await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!(%kind, %endpoint, error = %e, "tool host connection failed");
                client.close().await;
                self.state.connected = false;
                return false;
            }
        };

        if probe_tools {
            match client.list_tools().await {
                Ok(tools) => {
                    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
                    tracing::info!(?names, "tool host advertises tools");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "tool listing probe failed");
                }
            }
        }

        tracing::info!(
            %kind,
            %endpoint,
            server = %info.server_name,
            protocol = %info.protocol_version,
            "tool host connected"
        );

        self.client = Some(client);
        self.state = ConnectionState {
            kind: Some(kind),
            connected: true,
            endpoint: Some(endpoint),
        };
        true
    }

    /// Release the transport. Safe to call at any point, any number of times.
    pub async fn shutdown(&mut self) {
        if let Some(client) = self.client.take() {
            client.close().await;
            tracing::info!("tool host connection closed");
        }
        self.state.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejected_script_leaves_manager_disconnected() {
        let mut manager = ConnectionManager::new();
        assert!(!manager.connect_stdio("host.sh").await);
        assert!(!manager.is_connected());
        assert!(manager.client().is_none());
    }

    #[tokio::test]
    async fn unreachable_http_host_leaves_manager_disconnected() {
        let mut manager = ConnectionManager::new();
        assert!(!manager.connect_http("http://127.0.0.1:1/mcp").await);
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn shutdown_is_safe_without_a_connection() {
        let mut manager = ConnectionManager::new();
        manager.shutdown().await;
        manager.shutdown().await;
        assert!(!manager.is_connected());
    }

    #[test]
    fn default_state_reports_nothing() {
        let state = ConnectionState::default();
        assert!(!state.connected);
        assert!(state.kind.is_none());
        assert!(state.endpoint.is_none());
    }
}

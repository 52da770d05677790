//! Configuration loading from tether.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub tool_host: ToolHostConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub crm: CrmConfig,
}

/// LLM backend configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum output tokens per model call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// API key. Falls back to the ANTHROPIC_API_KEY environment variable.
    pub api_key: Option<String>,

    /// Optional system prompt.
    pub system: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_key: None,
            system: None,
        }
    }
}

impl BackendConfig {
    /// Resolve the API key from config or environment.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or(ConfigError::MissingApiKey)
    }
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

/// Which tool host to connect to at startup.
#[derive(Debug, Deserialize, Default)]
pub struct ToolHostConfig {
    /// Tool host script to spawn (stdio transport).
    pub stdio: Option<PathBuf>,

    /// Tool host endpoint URL (http transport).
    pub http: Option<String>,
}

/// A resolved tool host target.
#[derive(Debug, Clone)]
pub enum ToolHostTarget {
    Stdio(PathBuf),
    Http(String),
}

impl ToolHostConfig {
    /// Resolve the configured target, if any. Setting both is an error.
    pub fn target(&self) -> Result<Option<ToolHostTarget>, ConfigError> {
        match (&self.stdio, &self.http) {
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousToolHost),
            (Some(script), None) => Ok(Some(ToolHostTarget::Stdio(script.clone()))),
            (None, Some(url)) => Ok(Some(ToolHostTarget::Http(url.clone()))),
            (None, None) => Ok(None),
        }
    }
}

/// Web server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Upstream CRM API configuration for the embedded tool host.
#[derive(Debug, Deserialize)]
pub struct CrmConfig {
    #[serde(default = "default_crm_base_url")]
    pub base_url: String,

    /// API key. Falls back to the CRM_API_KEY environment variable.
    pub api_key: Option<String>,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            base_url: default_crm_base_url(),
            api_key: None,
        }
    }
}

impl CrmConfig {
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("CRM_API_KEY").ok())
    }
}

fn default_crm_base_url() -> String {
    "https://crm.example.com/api/services/CRM/Contact".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("API key not configured: set backend.api_key or ANTHROPIC_API_KEY")]
    MissingApiKey,

    #[error("ambiguous tool host: set either tool_host.stdio OR tool_host.http, not both")]
    AmbiguousToolHost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.backend.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.backend.max_tokens, 1000);
        assert_eq!(config.server.bind_address(), "0.0.0.0:8000");
        assert!(config.tool_host.target().unwrap().is_none());
    }

    #[test]
    fn full_config_parses() {
        let config = Config::parse(
            r#"
            [backend]
            model = "claude-3-5-haiku-20241022"
            max_tokens = 2048
            api_key = "sk-ant-api01-test"

            [tool_host]
            http = "http://localhost:8001/mcp"

            [server]
            host = "127.0.0.1"
            port = 9000

            [crm]
            base_url = "https://crm.internal/api/contact"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.backend.api_key().unwrap(), "sk-ant-api01-test");
        assert!(matches!(
            config.tool_host.target().unwrap(),
            Some(ToolHostTarget::Http(url)) if url == "http://localhost:8001/mcp"
        ));
        assert_eq!(config.server.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.crm.base_url, "https://crm.internal/api/contact");
    }

    #[test]
    fn both_tool_host_variants_is_an_error() {
        let config = Config::parse(
            r#"
            [tool_host]
            stdio = "host.py"
            http = "http://localhost:8001/mcp"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.tool_host.target(),
            Err(ConfigError::AmbiguousToolHost)
        ));
    }

    #[test]
    fn stdio_target_resolves() {
        let config = Config::parse("[tool_host]\nstdio = \"crm_host.py\"\n").unwrap();
        assert!(matches!(
            config.tool_host.target().unwrap(),
            Some(ToolHostTarget::Stdio(path)) if path == PathBuf::from("crm_host.py")
        ));
    }
}

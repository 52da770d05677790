mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use runtime::{AnthropicBackend, Bridge, ConnectionManager};
use web::{AppState, CrmClient, ToolHostState};

use config::{Config, ToolHostTarget};
use error::{Error, Result};

/// Default bind port for the standalone tool host.
const TOOLHOST_PORT: u16 = 8001;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Chat bridge between an LLM and a tool host", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = "tether.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the tool host and serve the chat front-end
    Serve {
        /// Tool host script to spawn (stdio transport)
        #[arg(long, value_name = "SCRIPT", conflicts_with = "http")]
        stdio: Option<PathBuf>,
        /// Tool host endpoint URL (http transport)
        #[arg(long, value_name = "URL")]
        http: Option<String>,
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Serve only the embedded CRM tool host
    Toolhost {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (defaults to 8001)
        #[arg(long)]
        port: Option<u16>,
    },
    /// List the tools a host advertises, then exit
    Tools {
        /// Tool host script to spawn (stdio transport)
        #[arg(long, value_name = "SCRIPT", conflicts_with = "http")]
        stdio: Option<PathBuf>,
        /// Tool host endpoint URL (http transport)
        #[arg(long, value_name = "URL")]
        http: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::Serve {
            stdio,
            http,
            host,
            port,
        }) => cmd_serve(config, stdio, http, host, port).await,
        None => cmd_serve(config, None, None, None, None).await,
        Some(Commands::Toolhost { host, port }) => cmd_toolhost(config, host, port).await,
        Some(Commands::Tools { stdio, http }) => cmd_tools(config, stdio, http).await,
    }
}

fn load_config(path: &PathBuf) -> Result<Config> {
    if path.exists() {
        let config = Config::load(path)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

/// Resolve the tool host target: CLI flags override the config file.
fn resolve_target(
    config: &Config,
    stdio: Option<PathBuf>,
    http: Option<String>,
) -> Result<Option<ToolHostTarget>> {
    match (stdio, http) {
        (Some(script), None) => Ok(Some(ToolHostTarget::Stdio(script))),
        (None, Some(url)) => Ok(Some(ToolHostTarget::Http(url))),
        // clap's conflicts_with rules this out, but the config layer can
        // still express it.
        (Some(_), Some(_)) => Err(Error::Config(config::ConfigError::AmbiguousToolHost)),
        (None, None) => Ok(config.tool_host.target()?),
    }
}

async fn connect(manager: &mut ConnectionManager, target: &ToolHostTarget) -> bool {
    match target {
        ToolHostTarget::Stdio(script) => manager.connect_stdio(script).await,
        ToolHostTarget::Http(url) => manager.connect_http(url).await,
    }
}

async fn cmd_serve(
    config: Config,
    stdio: Option<PathBuf>,
    http: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let api_key = config.backend.api_key()?;
    let mut builder = AnthropicBackend::builder(api_key, config.backend.model.as_str())
        .max_tokens(config.backend.max_tokens);
    if let Some(system) = &config.backend.system {
        builder = builder.system(system.as_str());
    }
    let backend = builder.build();
    tracing::info!(model = %config.backend.model, "LLM backend ready");

    let mut manager = ConnectionManager::new();
    match resolve_target(&config, stdio, http)? {
        Some(target) => {
            // A failed connect leaves the bridge serving in a degraded,
            // reportable state; /health shows it and /chat answers 503.
            if !connect(&mut manager, &target).await {
                tracing::warn!("starting without a tool host connection");
            }
        }
        None => {
            tracing::warn!(
                "no tool host configured; pass --stdio <script> or --http <url> to connect"
            );
        }
    }

    let bridge = Bridge::new(backend, manager);
    let state = AppState::new(bridge);

    let crm = CrmClient::new(config.crm.base_url.as_str(), config.crm.api_key())?;
    let toolhost = ToolHostState { crm: Arc::new(crm) };

    let addr = format!(
        "{}:{}",
        host.unwrap_or(config.server.host),
        port.unwrap_or(config.server.port)
    );
    let app = web::app(state.clone(), toolhost);
    web::serve(&addr, app).await?;

    // Serve returned, so the shutdown signal fired; release the tool host.
    state.bridge.lock().await.manager_mut().shutdown().await;
    Ok(())
}

async fn cmd_toolhost(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let crm = CrmClient::new(config.crm.base_url.as_str(), config.crm.api_key())?;
    let toolhost = ToolHostState { crm: Arc::new(crm) };

    let addr = format!(
        "{}:{}",
        host.unwrap_or(config.server.host),
        port.unwrap_or(TOOLHOST_PORT)
    );
    let app = web::toolhost_app(toolhost);
    web::serve(&addr, app).await?;
    Ok(())
}

async fn cmd_tools(config: Config, stdio: Option<PathBuf>, http: Option<String>) -> Result<()> {
    let target = resolve_target(&config, stdio, http)?.ok_or(Error::NoToolHost)?;

    let transport = match &target {
        ToolHostTarget::Stdio(script) => {
            mcp::Transport::Stdio(mcp::StdioTransport::new(script)?)
        }
        ToolHostTarget::Http(url) => mcp::Transport::Http(mcp::HttpTransport::new(url)?),
    };

    let client = mcp::Client::new(transport);
    let info = client.handshake().await?;
    println!(
        "connected to {} ({})",
        info.server_name,
        info.server_version.as_deref().unwrap_or("unknown version")
    );

    let tools = client.list_tools().await?;
    if tools.is_empty() {
        println!("no tools advertised");
    } else {
        for tool in tools {
            println!("  {}", tool.name);
            if let Some(description) = tool.description {
                println!("    {description}");
            }
        }
    }

    client.close().await;
    Ok(())
}

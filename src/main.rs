//! mcp-extension: MCP stdio server for desktop extensions.
//!
//! Configure via the environment:
//!
//! ```bash
//! ALLOWED_PATHS=/home/user/docs,/tmp/shared mcp-extension
//! ENABLE_LOGGING=true TOOL_TIMEOUT_MS=30000 mcp-extension
//! ```

use anyhow::{Context, Result};
use rmcp::service::ServiceExt;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use mcp_extension::{tools, Dispatcher, ExtensionConfig, ExtensionServer};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ExtensionConfig::from_env().context("Failed to load configuration")?;

    // Logs go to stderr; stdout carries the protocol.
    let default_level = if config.logging_enabled { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    tracing::info!(
        name = %config.name,
        version = %config.version,
        allowed_paths = ?config.allowed_paths,
        "Starting MCP extension server"
    );

    let registry = tools::builtin_registry(&config).context("Failed to build tool registry")?;
    let mut dispatcher = Dispatcher::new(registry);
    if let Some(timeout) = config.tool_timeout {
        dispatcher = dispatcher.with_timeout(timeout);
    }

    let server = ExtensionServer::new(config.name, config.version, dispatcher);

    tracing::info!("Serving on stdio");
    let service = server
        .serve(stdio())
        .await
        .context("Failed to start MCP service")?;

    service.waiting().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

//! memsync-mcp - memsync MCP server
//!
//! Serves the memory and file-sync tools over stdio. Stdout carries the
//! protocol, so logs go to stderr.

use anyhow::Context;
use memsync_core::client::{Connector, CredentialConnector};
use memsync_core::{AgentContext, Config};
use rmcp::ServiceExt;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod mcp;

use mcp::{McpServer, MemoryTools};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("memsync_mcp=info".parse()?)
                .add_directive("memsync_core=info".parse()?),
        )
        .init();

    info!("memsync-mcp v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().context("Failed to load configuration")?;
    let ctx = AgentContext::bootstrap(&config).context("Failed to initialize agent context")?;
    info!(
        "Machine {} ({}), session {}",
        ctx.machine.alias, ctx.machine.machine_id, ctx.session_id
    );

    let connector: Arc<dyn Connector> = Arc::new(CredentialConnector::from_config(&config));
    if connector.server_url().is_none() {
        info!("No credentials found; tools will report not authenticated until `memsync login`");
    }

    let server = McpServer::new(MemoryTools::new(Arc::new(ctx), connector));
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP server")?;

    service.waiting().await?;
    info!("Client disconnected, shutting down");
    Ok(())
}

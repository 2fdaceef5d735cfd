//! memsync - memory agent CLI
//!
//! Thin wrapper over memsync-core: credentials, machine identity, status and
//! one-shot shared-file sync.

use anyhow::Result;
use clap::Parser;
use memsync_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("memsync=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    // Execute command
    match cli.command {
        Commands::Login { server, token } => commands::auth::login(&server, token, &config),
        Commands::Logout => commands::auth::logout(&config),
        Commands::Status => commands::status::execute(&config),
        Commands::Sync { project } => commands::sync::execute(project.as_deref(), &config).await,
        Commands::Machine { alias } => commands::machine::execute(alias.as_deref(), &config),
        Commands::Version => {
            println!("memsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};

/// memsync - project memory and file sync across machines
#[derive(Parser, Debug)]
#[command(name = "memsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store server URL and token for this machine
    Login {
        /// Memory server URL (e.g. https://memory.example.com)
        #[arg(long, env = "MEMSYNC_SERVER_URL")]
        server: String,
        /// API token (prompted when omitted)
        #[arg(long)]
        token: Option<String>,
    },

    /// Remove stored credentials
    Logout,

    /// Show authentication, machine, project and git status
    Status,

    /// Synchronize shared files for the current project
    Sync {
        /// Project name or git remote URL (defaults to the current repository)
        #[arg(long, short)]
        project: Option<String>,
    },

    /// Show or change this machine's alias
    Machine {
        /// New human-readable alias
        #[arg(long)]
        alias: Option<String>,
    },

    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_project() {
        let cli = Cli::parse_from(["memsync", "sync", "-p", "widgets"]);
        match cli.command {
            Commands::Sync { project } => assert_eq!(project.as_deref(), Some("widgets")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_login() {
        let cli = Cli::parse_from(["memsync", "login", "--server", "https://m.example.com"]);
        match cli.command {
            Commands::Login { server, token } => {
                assert_eq!(server, "https://m.example.com");
                assert!(token.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

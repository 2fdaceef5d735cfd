//! Credential commands.
//!
//! `login` stores the server URL and token in `credentials.json` (0600);
//! `logout` removes the file. The MCP server reads credentials on every tool
//! call, so neither command requires restarting it.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Password;
use memsync_core::{Config, CredentialStore, Credentials};

fn store(config: &Config) -> CredentialStore {
    CredentialStore::new(config.paths.credentials_file())
}

/// Reject obviously wrong server URLs before they are persisted.
fn validate_server_url(server: &str) -> Result<()> {
    let server = server.trim();
    let Some(host) = server
        .strip_prefix("https://")
        .or_else(|| server.strip_prefix("http://"))
    else {
        bail!("Server URL must start with http:// or https:// (got {:?})", server);
    };
    if host.trim_matches('/').is_empty() {
        bail!("Server URL is missing a host");
    }
    Ok(())
}

/// Save credentials for this machine.
pub fn login(server: &str, token: Option<String>, config: &Config) -> Result<()> {
    validate_server_url(server)?;

    let token = match token {
        Some(t) => t,
        None => Password::new()
            .with_prompt("API token")
            .interact()
            .context("Failed to read token")?,
    };
    if token.trim().is_empty() {
        bail!("Token must not be empty");
    }

    let creds = Credentials::new(server, token);
    let store = store(config);
    store.save(&creds).context("Failed to save credentials")?;

    println!("{} Logged in to {}", "✓".green(), creds.server_url.cyan());
    println!(
        "  Token {} saved to {}",
        creds.token_hint().yellow(),
        store.path().display().to_string().cyan()
    );
    Ok(())
}

/// Remove stored credentials.
pub fn logout(config: &Config) -> Result<()> {
    if store(config).clear()? {
        println!("{} Logged out. Credentials removed.", "✓".green());
    } else {
        println!("{} Not logged in.", "✗".red());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_server_url() {
        assert!(validate_server_url("https://memory.example.com").is_ok());
        assert!(validate_server_url("http://localhost:3000").is_ok());
        assert!(validate_server_url("memory.example.com").is_err());
        assert!(validate_server_url("https://").is_err());
    }

    #[test]
    fn test_login_logout_roundtrip() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();

        login("https://memory.example.com/", Some("tok-123".into()), &config).unwrap();
        let saved = store(&config).load_file().unwrap().unwrap();
        assert_eq!(saved.server_url, "https://memory.example.com");
        assert_eq!(saved.token, "tok-123");

        logout(&config).unwrap();
        assert!(store(&config).load_file().unwrap().is_none());
    }

    #[test]
    fn test_login_rejects_empty_token() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert!(login("https://m.example.com", Some("  ".into()), &config).is_err());
        assert!(!config.paths.credentials_file().exists());
    }
}

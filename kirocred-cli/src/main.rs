//! kirocred CLI
//!
//! Command-line interface for inspecting the credentials kiro-cli stores
//! locally.
//!
//! # Usage
//!
//! ```bash
//! # Show which database would be read
//! kirocred locate
//!
//! # Resolve the credential (secrets redacted)
//! kirocred resolve
//!
//! # Machine-readable output from a specific database
//! kirocred resolve --db ~/.local/share/amazon-q/data.sqlite3 --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kirocred_core::{CredentialResolver, NormalizedCredential, Secret, StoreLocator};
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "kirocred")]
#[command(about = "Resolve kiro-cli credentials from the local store")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the path of the credential store that would be read
    Locate {
        /// Store path; `~` is expanded
        #[arg(long)]
        db: Option<String>,
    },

    /// Resolve and print the stored credential
    Resolve {
        /// Store path; `~` is expanded
        #[arg(long)]
        db: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print token and client secret values instead of redacting them
        #[arg(long)]
        show_secrets: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.log_level);
    if let Some(path) = &config.config_path {
        debug!("Loaded configuration from {:?}", path);
    }

    match cli.command {
        Commands::Locate { db } => locate(&config, db.as_deref()),
        Commands::Resolve {
            db,
            format,
            show_secrets,
        } => resolve(&config, db.as_deref(), format, show_secrets).await,
    }
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn store_path(config: &CliConfig, db: Option<&str>) -> Result<PathBuf> {
    let requested = db.or(config.store_path.as_deref());
    StoreLocator::from_env()
        .resolve_store_path(requested)
        .context("Failed to locate credential store")
}

fn locate(config: &CliConfig, db: Option<&str>) -> Result<()> {
    let path = store_path(config, db)?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("warning: {} does not exist", path.display());
    }
    Ok(())
}

async fn resolve(
    config: &CliConfig,
    db: Option<&str>,
    format: OutputFormat,
    show_secrets: bool,
) -> Result<()> {
    let path = store_path(config, db)?;

    let mut resolver = CredentialResolver::new(config.key_profile()?);
    if !config.extract_email {
        resolver = resolver.without_email_extraction();
    }

    let credential = resolver
        .resolve(&path)
        .await
        .with_context(|| format!("Failed to resolve credentials from {}", path.display()))?;

    match format {
        OutputFormat::Json => {
            let value = credential_json(&credential, show_secrets);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => print_text(&credential, show_secrets),
    }
    Ok(())
}

fn reveal(secret: &Secret, show: bool) -> String {
    if show {
        secret.expose().to_string()
    } else {
        secret.to_string()
    }
}

fn credential_json(credential: &NormalizedCredential, show_secrets: bool) -> serde_json::Value {
    json!({
        "provider": credential.provider(),
        "auth_method": credential.auth_method(),
        "region": credential.region(),
        "source_key": credential.source_key(),
        "email": credential.email(),
        "profile_arn": credential.profile_arn(),
        "expires_at": credential.expires_at(),
        "expired": credential.is_expired(),
        "scopes": credential.scopes(),
        "access_token": reveal(credential.access_token(), show_secrets),
        "refresh_token": reveal(credential.refresh_token(), show_secrets),
        "client_id": credential.client_id(),
        "client_secret": credential.client_secret().map(|s| reveal(s, show_secrets)),
    })
}

fn print_text(credential: &NormalizedCredential, show_secrets: bool) {
    let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();

    println!("Provider:      {}", credential.provider());
    println!("Auth method:   {}", credential.auth_method());
    println!("Region:        {}", credential.region());
    println!("Source key:    {}", credential.source_key());
    println!("Email:         {}", or_dash(credential.email()));
    println!("Profile ARN:   {}", or_dash(credential.profile_arn()));
    println!(
        "Expires at:    {}{}",
        credential.expires_at(),
        if credential.is_expired() { " (expired)" } else { "" }
    );
    if !credential.scopes().is_empty() {
        println!("Scopes:        {}", credential.scopes().join(", "));
    }
    println!(
        "Access token:  {}",
        reveal(credential.access_token(), show_secrets)
    );
    println!(
        "Refresh token: {}",
        reveal(credential.refresh_token(), show_secrets)
    );
    if let Some(client_id) = credential.client_id() {
        println!("Client ID:     {}", client_id);
    }
    if let Some(secret) = credential.client_secret() {
        println!("Client secret: {}", reveal(secret, show_secrets));
    }
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
    fn test_parse_resolve_flags() {
        let cli = Cli::try_parse_from([
            "kirocred",
            "resolve",
            "--db",
            "~/data.db",
            "--format",
            "json",
            "--show-secrets",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                db,
                format,
                show_secrets,
            } => {
                assert_eq!(db.as_deref(), Some("~/data.db"));
                assert!(matches!(format, OutputFormat::Json));
                assert!(show_secrets);
            }
            _ => panic!("expected resolve command"),
        }
    }

    #[test]
    fn test_reveal_redacts_by_default() {
        let secret = Secret::new("tok");
        assert_eq!(reveal(&secret, false), "[REDACTED]");
        assert_eq!(reveal(&secret, true), "tok");
    }

    #[test]
    fn test_explicit_db_overrides_config() {
        let config = CliConfig {
            store_path: Some("/from/config.sqlite3".to_string()),
            ..CliConfig::default()
        };
        assert_eq!(
            store_path(&config, Some("/from/flag.sqlite3")).unwrap(),
            PathBuf::from("/from/flag.sqlite3")
        );
        assert_eq!(
            store_path(&config, None).unwrap(),
            PathBuf::from("/from/config.sqlite3")
        );
    }
}

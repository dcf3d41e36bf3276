//! CLI configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use kirocred_core::{KeyProfile, TokenKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Credential store path; `~` is expanded. Probes the default install
    /// locations when unset.
    pub store_path: Option<String>,

    /// Decode the access token payload to find the account email.
    pub extract_email: bool,

    /// Logging level used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Overrides for the built-in kiro-cli key profile.
    pub profile: ProfileOverrides,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            extract_email: true,
            log_level: default_log_level(),
            profile: ProfileOverrides::default(),
            config_path: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Fields of [`KeyProfile`] that may be replaced from the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub provider: Option<String>,
    pub table: Option<String>,
    pub default_region: Option<String>,
    pub token_keys: Option<Vec<TokenKey>>,
    pub registration_keys: Option<Vec<String>>,
}

impl CliConfig {
    /// Build the key profile, applying overrides on top of the kiro-cli one.
    pub fn key_profile(&self) -> Result<KeyProfile> {
        let overrides = self.profile.clone();
        let mut profile = KeyProfile::kiro_cli();
        if let Some(provider) = overrides.provider {
            profile = profile.with_provider(provider);
        }
        if let Some(table) = overrides.table {
            profile = profile.with_table(table);
        }
        if let Some(region) = overrides.default_region {
            profile = profile.with_default_region(region);
        }
        if let Some(keys) = overrides.token_keys {
            profile = profile.with_token_keys(keys);
        }
        if let Some(keys) = overrides.registration_keys {
            profile = profile.with_registration_keys(keys);
        }

        profile.validate().context("Invalid key profile in configuration")?;
        Ok(profile)
    }
}

/// Load configuration from `explicit`, or from the default location.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<CliConfig> {
    let (config_path, required) = match explicit {
        Some(path) => (Some(path.to_path_buf()), true),
        None => (default_config_path(), false),
    };

    let Some(config_path) = config_path else {
        return Ok(CliConfig::default());
    };

    if !required && !config_path.exists() {
        return Ok(CliConfig::default());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config from {:?}", config_path))?;
    let mut config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config from {:?}", config_path))?;
    config.config_path = Some(config_path);
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "raibid-labs", "kirocred").map(|d| d.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirocred_core::KeyFlow;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (temp, path)
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert!(config.extract_email);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.key_profile().unwrap(), KeyProfile::kiro_cli());
    }

    #[test]
    fn test_load_overrides() {
        let (_temp, path) = write_config(
            r#"
store_path = "~/custom/data.sqlite3"
extract_email = false

[profile]
default_region = "eu-west-1"
registration_keys = ["custom:reg"]

[[profile.token_keys]]
key = "custom:token"
flow = "oidc"
"#,
        );

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.store_path.as_deref(), Some("~/custom/data.sqlite3"));
        assert!(!config.extract_email);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));

        let profile = config.key_profile().unwrap();
        assert_eq!(profile.default_region, "eu-west-1");
        assert_eq!(profile.token_keys.len(), 1);
        assert_eq!(profile.token_keys[0].flow, KeyFlow::Oidc);
        assert_eq!(profile.registration_keys, vec!["custom:reg"]);
        assert_eq!(profile.table, "auth_kv");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = load_config(Some(&temp.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_profile_is_rejected() {
        let (_temp, path) = write_config("[profile]\ntoken_keys = []\n");
        let config = load_config(Some(&path)).unwrap();
        assert!(config.key_profile().is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let (_temp, path) = write_config("store_path = [");
        assert!(load_config(Some(&path)).is_err());
    }
}

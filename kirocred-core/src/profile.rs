//! Key priority configuration.
//!
//! This module provides:
//! - [`KeyFlow`] - Login flow a token key belongs to
//! - [`TokenKey`] - One entry of the token priority list
//! - [`KeyProfile`] - Priority lists plus the constants of one credential source
//!
//! The built-in [`KeyProfile::kiro_cli`] profile matches the keys written by
//! kiro-cli and its Amazon Q predecessor. Adding a source means adding a
//! profile, not touching the resolver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider tag stamped on credentials from the kiro-cli database.
pub const KIRO_CLI_PROVIDER: &str = "kiro-cli";

/// Region used when neither the registration nor the token names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Table holding the key/value pairs in the kiro-cli database.
pub const DEFAULT_TABLE: &str = "auth_kv";

/// Login flow a token key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFlow {
    /// Social login (Google, GitHub, Microsoft, ...).
    Social,

    /// OIDC device flow (AWS Builder ID, IAM Identity Center).
    Oidc,
}

/// One entry of the token priority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenKey {
    /// Store key to look up.
    pub key: String,

    /// Flow the key belongs to.
    pub flow: KeyFlow,
}

impl TokenKey {
    /// A social-login token key.
    pub fn social(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            flow: KeyFlow::Social,
        }
    }

    /// An OIDC device-flow token key.
    pub fn oidc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            flow: KeyFlow::Oidc,
        }
    }
}

/// Error validating a [`KeyProfile`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("token key list is empty")]
    NoTokenKeys,

    #[error("store key must not be empty")]
    EmptyKey,

    #[error("default region must not be empty")]
    EmptyDefaultRegion,

    #[error("invalid table name: {table:?}")]
    InvalidTable { table: String },
}

/// Ordered lookup keys and constants for one credential source.
///
/// # Example
///
/// ```
/// use kirocred_core::profile::{KeyProfile, TokenKey};
///
/// let profile = KeyProfile::kiro_cli()
///     .with_token_keys(vec![TokenKey::oidc("custom:odic:token")])
///     .with_default_region("eu-west-1");
///
/// assert!(profile.is_oidc_key("custom:odic:token"));
/// assert!(profile.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyProfile {
    /// Provider tag stamped on resolved credentials.
    pub provider: String,

    /// Table the keys live in.
    pub table: String,

    /// Region used when no record names one.
    pub default_region: String,

    /// Token keys, highest priority first.
    pub token_keys: Vec<TokenKey>,

    /// Device registration keys, highest priority first.
    pub registration_keys: Vec<String>,
}

impl KeyProfile {
    /// Profile for the kiro-cli / Amazon Q SQLite database.
    pub fn kiro_cli() -> Self {
        Self {
            provider: KIRO_CLI_PROVIDER.to_string(),
            table: DEFAULT_TABLE.to_string(),
            default_region: DEFAULT_REGION.to_string(),
            token_keys: vec![
                TokenKey::social("kirocli:social:token"),
                TokenKey::oidc("kirocli:odic:token"),
                TokenKey::oidc("codewhisperer:odic:token"),
            ],
            registration_keys: vec![
                "kirocli:odic:device-registration".to_string(),
                "codewhisperer:odic:device-registration".to_string(),
            ],
        }
    }

    /// Replace the token priority list.
    pub fn with_token_keys(mut self, keys: Vec<TokenKey>) -> Self {
        self.token_keys = keys;
        self
    }

    /// Replace the registration priority list.
    pub fn with_registration_keys(mut self, keys: Vec<String>) -> Self {
        self.registration_keys = keys;
        self
    }

    /// Set the fallback region.
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    /// Set the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the provider tag.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Whether `key` is a token key of the OIDC flow.
    pub fn is_oidc_key(&self, key: &str) -> bool {
        self.token_keys
            .iter()
            .any(|k| k.key == key && k.flow == KeyFlow::Oidc)
    }

    /// Token key names in priority order.
    pub fn token_key_names(&self) -> Vec<String> {
        self.token_keys.iter().map(|k| k.key.clone()).collect()
    }

    /// Check the profile is usable for resolution.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.token_keys.is_empty() {
            return Err(ProfileError::NoTokenKeys);
        }
        if self
            .token_keys
            .iter()
            .map(|k| k.key.as_str())
            .chain(self.registration_keys.iter().map(String::as_str))
            .any(str::is_empty)
        {
            return Err(ProfileError::EmptyKey);
        }
        if self.default_region.trim().is_empty() {
            return Err(ProfileError::EmptyDefaultRegion);
        }
        if !is_identifier(&self.table) {
            return Err(ProfileError::InvalidTable {
                table: self.table.clone(),
            });
        }
        Ok(())
    }
}

impl Default for KeyProfile {
    fn default() -> Self {
        Self::kiro_cli()
    }
}

/// Whether `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

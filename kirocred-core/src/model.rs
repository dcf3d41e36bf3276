//! Domain model types for kirocred.
//!
//! This module defines the records read from the store and the credential
//! handed to API clients:
//! - [`RawTokenRecord`] - Token JSON as kiro-cli writes it
//! - [`RawRegistrationRecord`] - OIDC device registration JSON
//! - [`AuthMethod`] - How the credential was obtained
//! - [`NormalizedCredential`] - The merged, provider-agnostic result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::Secret;

/// Token record stored under one of the token priority keys.
///
/// Every field defaults, so any JSON object (or `null`) parses. Unknown
/// fields are ignored so newer writers don't break parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTokenRecord {
    /// Bearer token for API calls.
    pub access_token: Secret,

    /// Long-lived token used for refresh.
    pub refresh_token: Secret,

    /// CodeWhisperer profile ARN, present for some social logins.
    pub profile_arn: Option<String>,

    /// Expiry timestamp, kept verbatim (normally RFC 3339).
    pub expires_at: String,

    /// Region the token was issued in.
    pub region: Option<String>,

    /// Granted OAuth scopes.
    pub scopes: Option<Vec<String>>,
}

/// OIDC device registration stored alongside builder-id tokens.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRegistrationRecord {
    /// OIDC client identifier.
    pub client_id: String,

    /// OIDC client secret.
    pub client_secret: Secret,

    /// Region of the OIDC endpoint the client was registered with.
    pub region: Option<String>,
}

/// How the stored credential was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Social login (Google, GitHub, ...).
    Social,

    /// AWS Builder ID / IAM Identity Center via OIDC device flow.
    BuilderId,
}

impl AuthMethod {
    /// Get the auth method as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::BuilderId => "builder-id",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential resolved from the local store.
///
/// Only constructed by [`CredentialResolver`](crate::CredentialResolver)
/// from a successfully parsed [`RawTokenRecord`]; all fields are read-only.
#[derive(Debug, Clone)]
pub struct NormalizedCredential {
    pub(crate) access_token: Secret,
    pub(crate) refresh_token: Secret,
    pub(crate) profile_arn: Option<String>,
    pub(crate) expires_at: String,
    pub(crate) scopes: Vec<String>,
    pub(crate) auth_method: AuthMethod,
    pub(crate) provider: String,
    pub(crate) region: String,
    pub(crate) client_id: Option<String>,
    pub(crate) client_secret: Option<Secret>,
    pub(crate) email: Option<String>,
    pub(crate) source_key: String,
}

impl NormalizedCredential {
    pub fn access_token(&self) -> &Secret {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &Secret {
        &self.refresh_token
    }

    pub fn profile_arn(&self) -> Option<&str> {
        self.profile_arn.as_deref()
    }

    /// Expiry exactly as stored.
    pub fn expires_at(&self) -> &str {
        &self.expires_at
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    /// Fixed tag naming the source of this credential (e.g. `kiro-cli`).
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&Secret> {
        self.client_secret.as_ref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Store key the token record was read from.
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// Parse [`expires_at`](Self::expires_at) as an RFC 3339 timestamp.
    ///
    /// Returns `None` if the stored value is empty or not RFC 3339.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.expires_at.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Check if the access token has expired.
    ///
    /// Returns `false` if the expiry is unknown.
    pub fn is_expired(&self) -> bool {
        self.expires_at_utc()
            .map(|exp| exp <= Utc::now())
            .unwrap_or(false)
    }

    /// Check if the access token will expire within the given duration.
    pub fn expires_within(&self, duration: chrono::Duration) -> bool {
        self.expires_at_utc()
            .map(|exp| exp < Utc::now() + duration)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential_expiring(expires_at: &str) -> NormalizedCredential {
        NormalizedCredential {
            access_token: Secret::new("a"),
            refresh_token: Secret::new("r"),
            profile_arn: None,
            expires_at: expires_at.to_string(),
            scopes: Vec::new(),
            auth_method: AuthMethod::Social,
            provider: "kiro-cli".to_string(),
            region: "us-east-1".to_string(),
            client_id: None,
            client_secret: None,
            email: None,
            source_key: "kirocli:social:token".to_string(),
        }
    }

    #[test]
    fn test_token_record_minimal() {
        let record: RawTokenRecord =
            serde_json::from_str(r#"{"access_token":"a","expires_at":"x"}"#).unwrap();
        assert_eq!(record.access_token.expose(), "a");
        assert!(record.refresh_token.is_empty());
        assert!(record.profile_arn.is_none());
        assert!(record.scopes.is_none());
    }

    #[test]
    fn test_token_record_ignores_unknown_fields() {
        let record: RawTokenRecord = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_at":"x","start_url":"https://d-123.awsapps.com/start"}"#,
        )
        .unwrap();
        assert_eq!(record.refresh_token.expose(), "r");
    }

    #[test]
    fn test_token_record_without_access_token() {
        let record: RawTokenRecord =
            serde_json::from_str(r#"{"refresh_token":"r","expires_at":"x"}"#).unwrap();
        assert!(record.access_token.is_empty());
        assert_eq!(record.refresh_token.expose(), "r");
    }

    #[test]
    fn test_token_record_wrong_type_is_error() {
        let result = serde_json::from_str::<RawTokenRecord>(r#"{"access_token":42}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_registration_record_region_only() {
        let record: RawRegistrationRecord =
            serde_json::from_str(r#"{"region":"eu-west-1"}"#).unwrap();
        assert!(record.client_id.is_empty());
        assert!(record.client_secret.is_empty());
        assert_eq!(record.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_registration_record_null_region() {
        let record: RawRegistrationRecord =
            serde_json::from_str(r#"{"client_id":"c","client_secret":"s","region":null}"#)
                .unwrap();
        assert_eq!(record.client_id, "c");
        assert!(record.region.is_none());
    }

    #[test]
    fn test_auth_method_wire_names() {
        assert_eq!(AuthMethod::Social.to_string(), "social");
        assert_eq!(AuthMethod::BuilderId.to_string(), "builder-id");
        assert_eq!(
            serde_json::to_string(&AuthMethod::BuilderId).unwrap(),
            r#""builder-id""#
        );
    }

    #[test]
    fn test_expiry_parsing() {
        let expired = credential_expiring("2020-01-01T00:00:00.123456Z");
        assert!(expired.expires_at_utc().is_some());
        assert!(expired.is_expired());

        let future = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        let valid = credential_expiring(&future);
        assert!(!valid.is_expired());
        assert!(valid.expires_within(chrono::Duration::hours(2)));
        assert!(!valid.expires_within(chrono::Duration::minutes(30)));

        let unknown = credential_expiring("");
        assert!(unknown.expires_at_utc().is_none());
        assert!(!unknown.is_expired());
    }
}

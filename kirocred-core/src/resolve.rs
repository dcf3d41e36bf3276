//! Credential resolution against the local store.
//!
//! This module provides [`CredentialResolver`], which walks the priority
//! lists of a [`KeyProfile`], merges the token and registration records it
//! finds, and returns a [`NormalizedCredential`].
//!
//! Only two conditions are fatal once the store is open: the store is
//! missing, or no token key yields a usable record. Read errors, malformed
//! JSON, a missing registration and a missing email are logged at debug
//! level and resolution carries on.
//!
//! # Example
//!
//! ```rust,ignore
//! use kirocred_core::{CredentialResolver, StoreLocator};
//!
//! let path = StoreLocator::from_env().resolve_store_path(None)?;
//! let credential = CredentialResolver::kiro_cli().resolve(&path).await?;
//! println!("{} ({})", credential.auth_method(), credential.region());
//! ```

use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::CredentialError;
use crate::jwt::{self, PayloadDecoder, UnverifiedJwt};
use crate::model::{AuthMethod, NormalizedCredential, RawRegistrationRecord, RawTokenRecord};
use crate::profile::KeyProfile;
use crate::store::KvStore;

#[cfg(feature = "sqlite-store")]
use crate::store::SqliteKvStore;
#[cfg(feature = "sqlite-store")]
use std::path::Path;

/// Resolves a [`NormalizedCredential`] from a key-value store.
///
/// Holds no per-call state; one resolver can serve concurrent callers.
#[derive(Clone)]
pub struct CredentialResolver {
    profile: KeyProfile,
    decoder: Option<Arc<dyn PayloadDecoder>>,
}

impl CredentialResolver {
    /// Create a resolver for `profile` with JWT email extraction enabled.
    pub fn new(profile: KeyProfile) -> Self {
        Self {
            profile,
            decoder: Some(Arc::new(UnverifiedJwt)),
        }
    }

    /// Resolver for the built-in kiro-cli profile.
    pub fn kiro_cli() -> Self {
        Self::new(KeyProfile::kiro_cli())
    }

    /// Use a different decoder for the access token payload.
    pub fn with_payload_decoder(mut self, decoder: impl PayloadDecoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Skip email extraction entirely.
    pub fn without_email_extraction(mut self) -> Self {
        self.decoder = None;
        self
    }

    pub fn profile(&self) -> &KeyProfile {
        &self.profile
    }

    /// Open the SQLite store at `path` and resolve a credential from it.
    ///
    /// The store is closed before returning, on success and failure alike.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::StoreNotFound`] if `path` does not exist
    /// - [`CredentialError::StoreOpenFailed`] if it cannot be opened
    /// - [`CredentialError::NoValidToken`] if no token key yields a record
    #[cfg(feature = "sqlite-store")]
    pub async fn resolve(&self, path: &Path) -> Result<NormalizedCredential, CredentialError> {
        if !matches!(tokio::fs::try_exists(path).await, Ok(true)) {
            return Err(CredentialError::StoreNotFound {
                path: path.to_path_buf(),
            });
        }

        let store = SqliteKvStore::open(path, self.profile.table.as_str())
            .await
            .map_err(|source| CredentialError::StoreOpenFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let credential = self.resolve_with(store).await?;
        info!(
            path = %path.display(),
            provider = %self.profile.provider,
            "loaded credentials from store"
        );
        Ok(credential)
    }

    /// Resolve from an already opened store, closing it afterwards.
    pub async fn resolve_with<S: KvStore>(
        &self,
        store: S,
    ) -> Result<NormalizedCredential, CredentialError> {
        let result = self.resolve_from_store(&store).await;
        store.close().await;
        result
    }

    /// Resolve from a borrowed store; the caller keeps ownership and closes it.
    pub async fn resolve_from_store(
        &self,
        store: &dyn KvStore,
    ) -> Result<NormalizedCredential, CredentialError> {
        let token_keys = self.profile.token_keys.iter().map(|k| k.key.as_str());
        let Some((token_key, token)) = lookup_first::<RawTokenRecord>(store, token_keys, "token").await
        else {
            return Err(CredentialError::NoValidToken {
                tried: self.profile.token_key_names(),
            });
        };

        let registration_keys = self.profile.registration_keys.iter().map(String::as_str);
        let registration =
            lookup_first::<RawRegistrationRecord>(store, registration_keys, "device registration")
                .await
                .map(|(_, record)| record);

        Ok(self.assemble(token_key, token, registration))
    }

    fn assemble(
        &self,
        token_key: String,
        token: RawTokenRecord,
        registration: Option<RawRegistrationRecord>,
    ) -> NormalizedCredential {
        let auth_method = if registration.is_some() && self.profile.is_oidc_key(&token_key) {
            AuthMethod::BuilderId
        } else {
            AuthMethod::Social
        };

        let region = registration
            .as_ref()
            .and_then(|r| non_empty(r.region.as_deref()))
            .or_else(|| non_empty(token.region.as_deref()))
            .unwrap_or(self.profile.default_region.as_str())
            .to_string();

        let (client_id, client_secret) = match registration {
            Some(r) => (Some(r.client_id), Some(r.client_secret)),
            None => (None, None),
        };

        let email = self
            .decoder
            .as_deref()
            .and_then(|decoder| jwt::extract_email(decoder, token.access_token.expose()));

        let credential = NormalizedCredential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            profile_arn: token.profile_arn.filter(|arn| !arn.is_empty()),
            expires_at: token.expires_at,
            scopes: token.scopes.unwrap_or_default(),
            auth_method,
            provider: self.profile.provider.clone(),
            region,
            client_id,
            client_secret,
            email,
            source_key: token_key,
        };

        debug!(
            source_key = %credential.source_key,
            auth_method = %credential.auth_method,
            region = %credential.region,
            has_registration = credential.client_id.is_some(),
            has_email = credential.email.is_some(),
            "assembled credential"
        );
        credential
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::kiro_cli()
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("profile", &self.profile)
            .field("extract_email", &self.decoder.is_some())
            .finish()
    }
}

/// Return the first key holding a value that parses as `T`.
///
/// Missing keys, read errors and malformed values all move on to the next key.
async fn lookup_first<'a, T: DeserializeOwned + Default>(
    store: &dyn KvStore,
    keys: impl Iterator<Item = &'a str>,
    kind: &str,
) -> Option<(String, T)> {
    for key in keys {
        let value = match store.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(key, "no {} under key", kind);
                continue;
            }
            Err(e) => {
                debug!(key, error = %e, "error reading {} key", kind);
                continue;
            }
        };

        match parse_record::<T>(&value) {
            Ok(record) => {
                debug!(key, "loaded {} from store key", kind);
                return Some((key.to_string(), record));
            }
            Err(e) => {
                debug!(key, error = %e, "error parsing {} data", kind);
            }
        }
    }
    None
}

/// Parse a stored record. `null` yields the zero record; any JSON that is not
/// an object, or whose fields have the wrong types, is an error.
fn parse_record<T: DeserializeOwned + Default>(raw: &str) -> Result<T, serde_json::Error> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Null => Ok(T::default()),
        value @ Value::Object(_) => serde_json::from_value(value),
        other => Err(serde_json::Error::custom(format!(
            "expected a JSON object, found {other}"
        ))),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

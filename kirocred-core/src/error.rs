//! Top-level error types for kirocred.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// Fatal conditions of store location and credential resolution.
///
/// Per-key read and parse failures are not represented here; they are logged
/// and the next key is tried.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The current user's home directory could not be determined.
    #[error("failed to determine home directory")]
    HomeDirectoryUnavailable,

    /// The credential store file does not exist.
    #[error("credential store not found: {}", .path.display())]
    StoreNotFound { path: PathBuf },

    /// The credential store exists but could not be opened.
    #[error("failed to open credential store {}: {source}", .path.display())]
    StoreOpenFailed {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// None of the token keys held a usable record.
    #[error("no valid token found in credential store (tried keys: {})", .tried.join(", "))]
    NoValidToken { tried: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_valid_token_lists_keys() {
        let err = CredentialError::NoValidToken {
            tried: vec!["a:token".to_string(), "b:token".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no valid token found in credential store (tried keys: a:token, b:token)"
        );
    }

    #[test]
    fn test_store_not_found_names_path() {
        let err = CredentialError::StoreNotFound {
            path: PathBuf::from("/home/u/.local/share/kiro-cli/data.sqlite3"),
        };
        assert!(err.to_string().contains("/home/u/.local/share/kiro-cli/data.sqlite3"));
    }
}

//! Key-value store abstraction.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`KvStore`] - Point-lookup trait over a single logical key/value table
//! - [`MemoryKvStore`] - In-memory implementation for testing
//! - [`SqliteKvStore`] - Read-only SQLite implementation (with `sqlite-store` feature)
//!
//! # Key Convention
//!
//! Keys are opaque strings written by other programs, for example
//! `kirocli:social:token` or `kirocli:odic:device-registration`. Values are
//! JSON documents stored as text.
//!
//! # Example
//!
//! ```rust,ignore
//! use kirocred_core::store::{KvStore, MemoryKvStore};
//!
//! let store = MemoryKvStore::new();
//! store.insert("kirocli:social:token", r#"{"access_token":"a"}"#);
//!
//! let value = store.get("kirocli:social:token").await.unwrap();
//! assert!(value.is_some());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod memory;
#[cfg(feature = "sqlite-store")]
mod sqlite;

pub use memory::MemoryKvStore;
#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteKvStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the buffer is zeroed when the secret is dropped.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret holds an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for a single store operation.
///
/// These never abort a resolution on their own; the resolver logs them and
/// moves on to the next key.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    Backend { message: String },

    /// The store has already been closed.
    #[error("store is closed")]
    Closed,

    /// Error reported by the SQLite driver.
    #[cfg(feature = "sqlite-store")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),
}

/// Point lookups against a single logical key/value table.
///
/// Implementations include:
/// - [`MemoryKvStore`] - In-memory storage for testing
/// - [`SqliteKvStore`] (with `sqlite-store` feature) - kiro-cli database
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Retrieve the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Release the underlying handle.
    ///
    /// Further lookups after closing fail with [`StoreError::Closed`] or a
    /// backend error.
    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("super-secret");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_secret_display_redacted() {
        let secret = Secret::new("super-secret");
        let display = format!("{}", secret);
        assert!(!display.contains("super-secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_secret_deserializes_from_plain_string() {
        let secret: Secret = serde_json::from_str(r#""tok-123""#).unwrap();
        assert_eq!(secret.expose(), "tok-123");
        assert_eq!(secret.into_inner(), "tok-123");
    }
}

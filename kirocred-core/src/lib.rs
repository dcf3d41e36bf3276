//! # kirocred Core
//!
//! Reads the credentials kiro-cli (and Amazon Q before it) leave in their
//! local SQLite database and turns them into one normalized credential.
//!
//! This crate provides:
//! - [`StoreLocator`] - Finds the database, expanding `~` and probing install paths
//! - [`CredentialResolver`] - Priority-ordered token/registration lookup and merge
//! - [`KvStore`] - Point-lookup trait with SQLite and in-memory backends
//! - [`KeyProfile`] - The ordered key lists as configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kirocred_core::{CredentialResolver, StoreLocator};
//!
//! async fn load() -> Result<(), kirocred_core::CredentialError> {
//!     let path = StoreLocator::from_env().resolve_store_path(None)?;
//!     let credential = CredentialResolver::kiro_cli().resolve(&path).await?;
//!     println!("{} in {}", credential.auth_method(), credential.region());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod jwt;
pub mod locate;
pub mod model;
pub mod profile;
pub mod resolve;
pub mod store;

// Re-export commonly used types at crate root
pub use error::CredentialError;

pub use jwt::{PayloadDecoder, UnverifiedJwt};

pub use locate::{StoreLocator, default_candidates};

pub use model::{AuthMethod, NormalizedCredential, RawRegistrationRecord, RawTokenRecord};

pub use profile::{KeyFlow, KeyProfile, ProfileError, TokenKey};

pub use resolve::CredentialResolver;

pub use store::{KvStore, MemoryKvStore, Secret, StoreError};

#[cfg(feature = "sqlite-store")]
pub use store::SqliteKvStore;

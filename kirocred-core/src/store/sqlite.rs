//! Read-only SQLite store, as written by kiro-cli and Amazon Q.
//!
//! Schema: `auth_kv(key TEXT PRIMARY KEY, value TEXT)`. The table name is
//! configurable because older installs used other names for the same layout.

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{KvStore, StoreError};
use crate::profile::is_identifier;

/// A [`KvStore`] backed by an existing `SQLite` database file.
///
/// The database is opened read-only and never created; the file belongs to
/// another program.
pub struct SqliteKvStore {
    pool: SqlitePool,
    table: String,
    path: PathBuf,
}

impl SqliteKvStore {
    /// Open the database at `path` for lookups against `table`.
    ///
    /// `table` must be a plain identifier; it is interpolated into the query.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the connection cannot be established.
    pub async fn open(path: &Path, table: impl Into<String>) -> Result<Self, StoreError> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(StoreError::Backend {
                message: format!("invalid table name: {table:?}"),
            });
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        debug!(path = %path.display(), table = %table, "opened credential store");
        Ok(Self {
            pool,
            table,
            path: path.to_path_buf(),
        })
    }
}

impl std::fmt::Debug for SqliteKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteKvStore")
            .field("path", &self.path)
            .field("table", &self.table)
            .finish()
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }
        let sql = format!("SELECT value FROM {} WHERE key = ?", self.table);
        let value: Option<String> = sqlx::query_scalar(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!(path = %self.path.display(), "closed credential store");
    }
}

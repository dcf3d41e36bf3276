//! In-memory key-value store implementation.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{KvStore, StoreError};

#[derive(Default)]
struct Inner {
    values: RwLock<HashMap<String, String>>,
    failures: RwLock<HashMap<String, String>>,
    closes: AtomicUsize,
}

/// In-memory key-value store for testing and development.
///
/// Clones share the same underlying data, so a test can keep a handle to
/// inspect [`close_count`](MemoryKvStore::close_count) after handing the
/// store to a resolver.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<Inner>,
}

impl MemoryKvStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store with initial data.
    pub fn with_data<K, V>(data: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        for (key, value) in data {
            store.insert(key, value);
        }
        store
    }

    /// Store `value` under `key`, overwriting any existing value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.values.write().insert(key.into(), value.into());
    }

    /// Make every lookup of `key` fail with a backend error.
    pub fn fail_on(&self, key: impl Into<String>, message: impl Into<String>) {
        self.inner
            .failures
            .write()
            .insert(key.into(), message.into());
    }

    /// Number of times [`KvStore::close`] has been called.
    pub fn close_count(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    /// Whether the store has been closed at least once.
    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

impl std::fmt::Debug for MemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKvStore")
            .field("keys_count", &self.inner.values.read().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        if let Some(message) = self.inner.failures.read().get(key) {
            return Err(StoreError::Backend {
                message: message.clone(),
            });
        }
        Ok(self.inner.values.read().get(key).cloned())
    }

    async fn close(&self) {
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
    }
}

//! Key-value storage consumed by the side-channel engine.
//!
//! The engine only relies on the [`KvStore`] contract: point reads and writes, deletes that
//! tolerate missing keys, and ordered prefix scans. Isolation comes from [`CacheStore`], a
//! write-buffering child scope that is either merged into its parent or dropped.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod cache;
mod mem;

#[cfg(feature = "redb")]
mod redb_store;

pub use cache::CacheStore;
pub use mem::MemStore;

#[cfg(feature = "redb")]
pub use redb_store::RedbStore;

/// Key/value pairs returned by a prefix scan, in ascending key order.
pub type KvPairs = Vec<(Vec<u8>, Vec<u8>)>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(String),

    #[error("Failed to encode value for key {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("Failed to decode value for key {key}: {reason}")]
    Decode { key: String, reason: String },
}

impl StoreError {
    pub fn encode(key: &[u8], reason: impl ToString) -> Self {
        Self::Encode {
            key: printable_key(key),
            reason: reason.to_string(),
        }
    }

    pub fn decode(key: &[u8], reason: impl ToString) -> Self {
        Self::Decode {
            key: printable_key(key),
            reason: reason.to_string(),
        }
    }
}

fn printable_key(key: &[u8]) -> String {
    key.escape_ascii().to_string()
}

/// A transactional key-value store.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Deleting a missing key is a no-op.
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<KvPairs, StoreError>;
}

impl<S> KvStore for &mut S
where
    S: KvStore + ?Sized,
{
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        (**self).has(key)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<KvPairs, StoreError> {
        (**self).scan_prefix(prefix)
    }
}

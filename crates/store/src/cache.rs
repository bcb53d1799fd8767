use std::collections::BTreeMap;

use tracing::trace;

use crate::{KvPairs, KvStore, StoreError};

/// A nested, rollback-capable scope over a parent store.
///
/// Reads see the scope's own pending writes first, then the parent. Writes are buffered
/// until [`CacheStore::write`] merges them into the parent; dropping the scope (or calling
/// [`CacheStore::discard`]) leaves the parent untouched.
pub struct CacheStore<'a> {
    parent: &'a mut dyn KvStore,
    // `None` marks a pending delete
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            pending: BTreeMap::new(),
        }
    }

    /// Merges all pending writes into the parent, in key order.
    pub fn write(self) -> Result<(), StoreError> {
        trace!(writes = self.pending.len(), "Merging cached writes into parent store");

        for (key, value) in self.pending {
            match value {
                Some(value) => self.parent.set(&key, &value)?,
                None => self.parent.delete(&key)?,
            }
        }

        Ok(())
    }

    /// Drops all pending writes.
    pub fn discard(self) {
        trace!(writes = self.pending.len(), "Discarding cached writes");
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.pending.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<KvPairs, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.scan_prefix(prefix)?.into_iter().collect();

        let overlay = self
            .pending
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix));

        for (key, value) in overlay {
            match value {
                Some(value) => merged.insert(key.clone(), value.clone()),
                None => merged.remove(key),
            };
        }

        Ok(merged.into_iter().collect())
    }
}

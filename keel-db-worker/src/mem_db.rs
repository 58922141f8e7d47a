// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use keel_db_exports::{DBBatch, StoreController, StoreError, StoreIterator, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// `StoreController` backed by an in-memory ordered map.
///
/// Nothing is persisted; flush and close are no-ops. Intended for tests
/// and throwaway nodes, which is also why it reports no cleanup support.
#[derive(Default)]
pub struct MemStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemStore({} entries)", self.data.read().len())
    }
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreController for MemStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &[u8]) -> Result<Option<Value>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.data.write().remove(key);
        Ok(())
    }

    fn prefix_iterator<'a>(&'a self, prefix: &[u8]) -> StoreIterator<'a> {
        // snapshot the matching range so the lock is not held while the
        // caller drives the iterator
        let entries: Vec<(Vec<u8>, Vec<u8>)> = self
            .data
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Box::new(entries.into_iter().map(Ok))
    }

    fn write_batch(&self, batch: DBBatch) -> Result<(), StoreError> {
        // one write lock for the whole batch makes it atomic for readers
        let mut data = self.data.write();
        for (key, value) in batch {
            match value {
                Some(value) => {
                    data.insert(key, value);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn supports_cleanup(&self) -> bool {
        false
    }

    fn cleanup(&self) -> Result<(), StoreError> {
        Err(StoreError::NothingToCleanUp)
    }
}

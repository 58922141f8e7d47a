// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use keel_db_exports::{DBBatch, StoreController, StoreError, StoreIterator, Value};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// `StoreController` backed by a sled database.
///
/// sled compacts incrementally on its own, so the explicit cleanup hook
/// reports unsupported.
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SledStore({})", self.path.display())
    }
}

impl SledStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path)
            .map_err(|e| StoreError::OperationError(format!("sled open: {}", e)))?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }
}

impl StoreController for SledStore {
    fn engine(&self) -> &'static str {
        "sled"
    }

    fn get(&self, key: &[u8]) -> Result<Option<Value>, StoreError> {
        self.db
            .get(key)
            .map(|value| value.map(|v| v.to_vec()))
            .map_err(|e| StoreError::OperationError(format!("sled get: {}", e)))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db
            .insert(key, value)
            .map(|_| ())
            .map_err(|e| StoreError::OperationError(format!("sled insert: {}", e)))
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db
            .remove(key)
            .map(|_| ())
            .map_err(|e| StoreError::OperationError(format!("sled remove: {}", e)))
    }

    fn prefix_iterator<'a>(&'a self, prefix: &[u8]) -> StoreIterator<'a> {
        Box::new(self.db.scan_prefix(prefix).map(|entry| {
            entry
                .map(|(key, value)| (key.to_vec(), value.to_vec()))
                .map_err(|e| StoreError::OperationError(format!("sled iterator: {}", e)))
        }))
    }

    fn write_batch(&self, batch: DBBatch) -> Result<(), StoreError> {
        let mut sled_batch = sled::Batch::default();
        for (key, value) in batch {
            match value {
                Some(value) => sled_batch.insert(key, value),
                None => sled_batch.remove(key),
            }
        }
        self.db
            .apply_batch(sled_batch)
            .map_err(|e| StoreError::OperationError(format!("sled apply_batch: {}", e)))
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|e| StoreError::OperationError(format!("sled flush: {}", e)))
    }

    fn close(&self) -> Result<(), StoreError> {
        self.flush()
    }

    fn supports_cleanup(&self) -> bool {
        false
    }

    fn cleanup(&self) -> Result<(), StoreError> {
        Err(StoreError::NothingToCleanUp)
    }
}

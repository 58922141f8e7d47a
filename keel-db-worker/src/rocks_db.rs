// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use keel_db_exports::{DBBatch, StoreController, StoreError, StoreIterator, Value};
use rocksdb::{Direction, IteratorMode, Options, ReadOptions, WriteBatch, DB};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// `StoreController` backed by a RocksDB instance.
///
/// The only backend with a real compaction operation, so the only one
/// reporting cleanup support.
pub struct RocksDbStore {
    db: DB,
    path: PathBuf,
}

impl Debug for RocksDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RocksDbStore({})", self.path.display())
    }
}

impl RocksDbStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        let db = DB::open(&db_opts, path)
            .map_err(|e| StoreError::OperationError(format!("rocksdb open: {}", e)))?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }
}

impl StoreController for RocksDbStore {
    fn engine(&self) -> &'static str {
        "rocksdb"
    }

    fn get(&self, key: &[u8]) -> Result<Option<Value>, StoreError> {
        self.db
            .get(key)
            .map_err(|e| StoreError::OperationError(format!("rocksdb get: {}", e)))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db
            .put(key, value)
            .map_err(|e| StoreError::OperationError(format!("rocksdb put: {}", e)))
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db
            .delete(key)
            .map_err(|e| StoreError::OperationError(format!("rocksdb delete: {}", e)))
    }

    fn prefix_iterator<'a>(&'a self, prefix: &[u8]) -> StoreIterator<'a> {
        let mut opt = ReadOptions::default();
        if let Some(end) = end_prefix(prefix) {
            opt.set_iterate_upper_bound(end);
        }
        let mode = if prefix.is_empty() {
            IteratorMode::Start
        } else {
            IteratorMode::From(prefix, Direction::Forward)
        };
        Box::new(self.db.iterator_opt(mode, opt).map(|entry| {
            entry
                .map(|(key, value)| (key.to_vec(), value.to_vec()))
                .map_err(|e| StoreError::OperationError(format!("rocksdb iterator: {}", e)))
        }))
    }

    fn write_batch(&self, batch: DBBatch) -> Result<(), StoreError> {
        let mut write_batch = WriteBatch::default();
        for (key, value) in batch {
            match value {
                Some(value) => write_batch.put(key, value),
                None => write_batch.delete(key),
            }
        }
        self.db
            .write(write_batch)
            .map_err(|e| StoreError::OperationError(format!("rocksdb write: {}", e)))
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::OperationError(format!("rocksdb flush: {}", e)))
    }

    fn close(&self) -> Result<(), StoreError> {
        self.flush()?;
        self.db.cancel_all_background_work(true);
        Ok(())
    }

    fn supports_cleanup(&self) -> bool {
        true
    }

    fn cleanup(&self) -> Result<(), StoreError> {
        self.db.compact_range(None::<&[u8]>, None::<&[u8]>);
        Ok(())
    }
}

/// For a given start prefix (inclusive), returns the correct end prefix
/// (non-inclusive). This assumes the key bytes are ordered in
/// lexicographical order. `None` when no bounded end exists (empty prefix
/// or a prefix of only `0xff` bytes).
pub(crate) fn end_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end_range = prefix.to_vec();
    while let Some(0xff) = end_range.last() {
        end_range.pop();
    }
    if let Some(byte) = end_range.last_mut() {
        *byte += 1;
        Some(end_range)
    } else {
        None
    }
}

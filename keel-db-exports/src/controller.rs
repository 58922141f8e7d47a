// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::{DBBatch, Key, StoreError, Value};
use std::fmt::Debug;

/// Lazy, fallible stream of key/value entries in store-native key order.
/// A store I/O error ends the stream; callers must not skip past it.
pub type StoreIterator<'a> = Box<dyn Iterator<Item = Result<(Key, Value), StoreError>> + 'a>;

/// Contract of an ordered, byte-keyed, durable key-value store.
///
/// Implementations must guarantee that `write_batch` is atomic: either
/// every queued set/delete becomes visible or none does, including across
/// a crash. They must also tolerate `cleanup` running concurrently with
/// reads and writes.
pub trait StoreController: Send + Sync + Debug {
    /// Backend engine name, for logs
    fn engine(&self) -> &'static str;

    /// Point lookup. `Ok(None)` means the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Value>, StoreError>;

    /// Sets a key to a value, overwriting any previous value.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Deletes a key. Deleting an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Iterates every entry whose key starts with `prefix`, in
    /// store-native (lexicographic) key order.
    fn prefix_iterator<'a>(&'a self, prefix: &[u8]) -> StoreIterator<'a>;

    /// Applies the batch as one atomic write.
    fn write_batch(&self, batch: DBBatch) -> Result<(), StoreError>;

    /// Persists all buffered writes to disk.
    fn flush(&self) -> Result<(), StoreError>;

    /// Flushes and releases the store. The store must not be used after
    /// a successful close.
    fn close(&self) -> Result<(), StoreError>;

    /// Whether the backend has a compaction/cleanup operation at all.
    /// When false, `cleanup` returns `StoreError::NothingToCleanUp`.
    fn supports_cleanup(&self) -> bool;

    /// Runs the backend compaction/cleanup operation.
    fn cleanup(&self) -> Result<(), StoreError>;
}

// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use std::collections::BTreeMap;

/// Serialized key
pub type Key = Vec<u8>;
/// Serialized value
pub type Value = Vec<u8>;

/// Batch of writes applied atomically by `StoreController::write_batch`:
/// `Some(value)` sets the key, `None` deletes it. Later operations on the
/// same key within one batch overwrite earlier ones, which is exactly the
/// semantics the delete-old-key/insert-new-key transitions rely on.
pub type DBBatch = BTreeMap<Key, Option<Value>>;

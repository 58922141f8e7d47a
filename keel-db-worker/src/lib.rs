// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Backend implementations of the `StoreController` contract defined in
//! `keel-db-exports`: RocksDB and sled for durable storage, plus an
//! in-memory store for tests and throwaway nodes.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod mem_db;
mod rocks_db;
mod sled_db;

pub use mem_db::MemStore;
pub use rocks_db::RocksDbStore;
pub use sled_db::SledStore;

use keel_db_exports::{StoreConfig, StoreController, StoreEngine, StoreError};
use std::sync::Arc;

/// Opens the store backend selected by `config`.
///
/// Engine selection happens strictly by the configured engine; there is no
/// fallback. Unrecognized engine names are rejected earlier, when the
/// configuration string is parsed into a `StoreEngine`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn StoreController>, StoreError> {
    match config.engine {
        StoreEngine::RocksDb => Ok(Arc::new(RocksDbStore::open(&config.path)?)),
        StoreEngine::Sled => Ok(Arc::new(SledStore::open(&config.path)?)),
        StoreEngine::Memory => Ok(Arc::new(MemStore::new())),
    }
}

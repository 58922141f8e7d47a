// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::StoreError;
use std::path::PathBuf;
use std::str::FromStr;

/// Selectable store backend engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEngine {
    /// RocksDB on-disk store
    RocksDb,
    /// sled on-disk store
    Sled,
    /// In-memory store, for tests and throwaway nodes
    Memory,
}

impl FromStr for StoreEngine {
    type Err = StoreError;

    /// Parses the configured engine name. An unrecognized name is a
    /// configuration error the caller must treat as fatal; there is no
    /// fallback engine.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rocksdb" => Ok(StoreEngine::RocksDb),
            "sled" => Ok(StoreEngine::Sled),
            "memory" => Ok(StoreEngine::Memory),
            other => Err(StoreError::UnknownEngine(other.to_string())),
        }
    }
}

/// Config structure for opening a store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// selected backend engine
    pub engine: StoreEngine,
    /// path to the database directory (ignored by the memory engine)
    pub path: PathBuf,
}

// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::NodeError;
use keel_db_exports::{StoreConfig, StoreEngine};
use serde::Deserialize;
use std::path::PathBuf;

/// Database section of the node configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// backend engine name: `rocksdb`, `sled` or `memory`
    pub engine: String,
    /// path to the database directory
    pub path: PathBuf,
}

impl DatabaseSettings {
    /// Resolves the configured engine name into a typed store config.
    /// Unrecognized names are a fatal configuration error.
    pub fn store_config(&self) -> Result<StoreConfig, NodeError> {
        let engine: StoreEngine = self
            .engine
            .parse()
            .map_err(|e| NodeError::ConfigurationError(format!("{}", e)))?;
        Ok(StoreConfig {
            engine,
            path: self.path.clone(),
        })
    }
}

// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use displaydoc::Display;
use keel_db_exports::StoreError;
use thiserror::Error;

/// Node error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum NodeError {
    /// configuration error: {0}
    ConfigurationError(String),
    /// database schema version mismatch: found {found}, expected {expected}; please delete the database folder and resynchronize the node
    SchemaVersionMismatch {
        /// version stamped in the store
        found: u64,
        /// version this node writes
        expected: u64,
    },
    /// corrupt metadata record: {0}
    CorruptMetadata(String),
    /// store error: {0}
    StoreError(#[from] StoreError),
}

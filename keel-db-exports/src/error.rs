// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use displaydoc::Display;
use thiserror::Error;

/// Store error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// unknown database engine: {0}, supported engines: rocksdb/sled/memory
    UnknownEngine(String),
    /// store operation failed: {0}
    OperationError(String),
    /// nothing to clean up
    NothingToCleanUp,
}

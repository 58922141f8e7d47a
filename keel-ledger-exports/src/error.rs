// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use displaydoc::Display;
use keel_db_exports::StoreError;
use keel_models::ModelsError;
use keel_serialization::SerializeError;
use thiserror::Error;

/// Ledger error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum LedgerError {
    /// invalid treasury state: {0}
    InvalidTreasuryState(String),
    /// corrupt record: {0}
    CorruptRecord(String),
    /// invalid rollback: {0}
    InvalidRollback(String),
    /// store error: {0}
    StoreError(#[from] StoreError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// serialization error: {0}
    SerializeError(#[from] SerializeError),
}

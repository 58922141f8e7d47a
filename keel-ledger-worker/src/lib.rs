// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Implementation of the ledger manager defined in `keel-ledger-exports`:
//! milestone application and rollback over an ordered key-value store,
//! spent/unspent bookkeeping of outputs and the treasury singleton.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod ledger_manager;

pub use ledger_manager::LedgerManager;

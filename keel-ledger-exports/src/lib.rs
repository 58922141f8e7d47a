// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Types, binary codec and contract of the UTXO/treasury ledger: the
//! entities persisted by the ledger manager, the key-prefix scheme
//! partitioning the flat key-value namespace, the milestone mutation
//! batch, and the `LedgerController` trait implemented by
//! `keel-ledger-worker`.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod controller;
mod error;
mod key;
mod ledger_changes;
mod output;
mod treasury_output;
mod types;

pub use controller::{LedgerController, LedgerIterator, LedgerReadGuard};
pub use error::LedgerError;
pub use key::{
    ledger_index_key, output_key, spent_output_key, spent_treasury_prefix, treasury_prefix,
    unspent_output_key, unspent_treasury_prefix, TreasuryKey, TreasuryKeyDeserializer,
    TreasuryKeySerializer, LEDGER_INDEX_PREFIX, OUTPUT_PREFIX, OUTPUT_SPENT_PREFIX,
    OUTPUT_UNSPENT_PREFIX, TREASURY_OUTPUT_PREFIX, TREASURY_SPENT_IDENT, TREASURY_UNSPENT_IDENT,
};
pub use ledger_changes::{LedgerChanges, TreasuryChange};
pub use output::{Output, OutputDeserializer, OutputSerializer, Spent, SpentDeserializer, SpentSerializer};
pub use treasury_output::{TreasuryOutput, TreasuryOutputDeserializer, TreasuryOutputSerializer};
pub use types::IterateOptions;

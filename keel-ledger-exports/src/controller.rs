// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::{IterateOptions, LedgerChanges, LedgerError, Output, Spent, TreasuryOutput};
use keel_models::{MilestoneId, MilestoneIndex, OutputId};
use std::fmt::Debug;

/// Lazy, fallible stream of ledger entities.
///
/// Iterators are fused on error: once an item yields `Err`, no further
/// items are produced. Depending on `IterateOptions` the iterator may
/// hold the ledger read lock for its whole lifetime, so drop it before
/// applying milestones from the same thread.
pub type LedgerIterator<'a, T> = Box<dyn Iterator<Item = Result<T, LedgerError>> + 'a>;

/// Opaque scoped read guard over the ledger lock.
///
/// Multi-step read sequences hold it so every step observes one
/// consistent point in time; milestone application blocks until the
/// guard is dropped.
pub struct LedgerReadGuard<'a> {
    _guard: Box<dyn Sync + 'a>,
}

impl<'a> LedgerReadGuard<'a> {
    /// Wraps an implementation-specific lock guard
    pub fn new(guard: impl Sync + 'a) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

/// Interface of the ledger manager: the UTXO set, the treasury
/// singleton and the persisted ledger milestone index.
pub trait LedgerController: Send + Sync + Debug {
    /// Index of the last milestone applied to the ledger, `None` on a
    /// fresh store. An unreadable stored index is a `CorruptRecord`.
    fn ledger_index(&self) -> Result<Option<MilestoneIndex>, LedgerError>;

    /// Applies the mutations confirmed by milestone `index` as one
    /// atomic batch, including the ledger index update.
    fn apply_milestone(
        &self,
        index: MilestoneIndex,
        changes: &LedgerChanges,
    ) -> Result<(), LedgerError>;

    /// Reverts the mutations of the most recently applied milestone,
    /// restoring consumed outputs and moving the ledger index back.
    /// `index` must equal the current ledger index.
    fn rollback_milestone(
        &self,
        index: MilestoneIndex,
        changes: &LedgerChanges,
    ) -> Result<(), LedgerError>;

    /// Reads the output record for `output_id`, `None` when unknown
    fn output(&self, output_id: &OutputId) -> Result<Option<Output>, LedgerError>;

    /// Whether `output_id` currently carries an unspent marker
    fn is_output_unspent(&self, output_id: &OutputId) -> Result<bool, LedgerError>;

    /// Reads the spent record for `output_id`, `None` when the output
    /// is unknown or still unspent
    fn spent_output(&self, output_id: &OutputId) -> Result<Option<Spent>, LedgerError>;

    /// Stores a treasury output in the partition matching its spend flag
    fn add_treasury_output(&self, output: &TreasuryOutput) -> Result<(), LedgerError>;

    /// Deletes a treasury output from the partition matching its spend
    /// flag; deleting an absent output is not an error
    fn delete_treasury_output(&self, output: &TreasuryOutput) -> Result<(), LedgerError>;

    /// Takes the shared ledger lock for a multi-step read sequence;
    /// held for the lifetime of the returned guard
    fn read_lock_ledger(&self) -> LedgerReadGuard<'_>;

    /// Moves a treasury output from the unspent to the spent partition
    /// as one atomic delete-plus-insert; no observer sees both keys or
    /// neither key present
    fn mark_treasury_output_spent(&self, output: &TreasuryOutput) -> Result<(), LedgerError>;

    /// Inverse of `mark_treasury_output_spent`, used on rollback
    fn mark_treasury_output_unspent(&self, output: &TreasuryOutput) -> Result<(), LedgerError>;

    /// The single unspent treasury output.
    ///
    /// Errors with `InvalidTreasuryState` when none or more than one
    /// exists: both states mean the store can no longer vouch for the
    /// protocol-held funds.
    fn unspent_treasury_output(&self) -> Result<TreasuryOutput, LedgerError>;

    /// The spent treasury output generated by `milestone_id`, if any
    fn spent_treasury_output(
        &self,
        milestone_id: &MilestoneId,
    ) -> Result<Option<TreasuryOutput>, LedgerError>;

    /// Point lookup in the unspent partition: the unspent treasury
    /// output generated by `milestone_id`, if any. Unlike
    /// `unspent_treasury_output` this performs no singleton check.
    fn unspent_treasury_output_for(
        &self,
        milestone_id: &MilestoneId,
    ) -> Result<Option<TreasuryOutput>, LedgerError>;

    /// Iterates every treasury output, spent and unspent
    fn treasury_outputs(&self, options: IterateOptions) -> LedgerIterator<'_, TreasuryOutput>;

    /// Iterates the spent treasury partition only
    fn spent_treasury_outputs(&self, options: IterateOptions)
        -> LedgerIterator<'_, TreasuryOutput>;

    /// Iterates every output currently carrying an unspent marker
    fn unspent_outputs(&self, options: IterateOptions) -> LedgerIterator<'_, Output>;
}

// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::{Output, TreasuryOutput};

/// Treasury mutation carried by a milestone: the new unspent output it
/// creates, and optionally the previous one it marks spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasuryChange {
    /// treasury output created by the milestone, stored unspent
    pub new_output: TreasuryOutput,
    /// previously-unspent treasury output the milestone consumes, if any
    pub spent_output: Option<TreasuryOutput>,
}

/// Full set of ledger mutations confirmed by one milestone.
///
/// Applied as a single atomic batch together with the ledger index
/// update; a partially-applied milestone is never observable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerChanges {
    /// outputs created by the milestone
    pub created_outputs: Vec<Output>,
    /// previously-unspent outputs consumed by the milestone
    pub consumed_outputs: Vec<Output>,
    /// treasury mutation, if the milestone carries one
    pub treasury: Option<TreasuryChange>,
}

impl LedgerChanges {
    /// True when the milestone confirms no ledger mutation at all
    pub fn is_empty(&self) -> bool {
        self.created_outputs.is_empty()
            && self.consumed_outputs.is_empty()
            && self.treasury.is_none()
    }
}

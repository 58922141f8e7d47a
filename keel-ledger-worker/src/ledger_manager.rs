// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Ledger manager over an ordered key-value store.
//!
//! All milestone-level mutations go through a single atomic batch so
//! that a crash can never expose a half-applied milestone. Point reads
//! take no lock; iteration takes the instance read lock unless the
//! caller opts out.

use keel_db_exports::{DBBatch, StoreController, StoreIterator};
use keel_ledger_exports::{
    ledger_index_key, output_key, spent_output_key, spent_treasury_prefix, treasury_prefix,
    unspent_output_key, unspent_treasury_prefix, IterateOptions, LedgerChanges, LedgerController,
    LedgerError, LedgerIterator, LedgerReadGuard, Output, OutputDeserializer, OutputSerializer, Spent,
    SpentDeserializer, SpentSerializer, TreasuryKey, TreasuryKeySerializer, TreasuryOutput,
    TreasuryOutputDeserializer, TreasuryOutputSerializer, OUTPUT_UNSPENT_PREFIX,
};
use keel_models::{
    MilestoneId, MilestoneIndex, MilestoneIndexDeserializer, MilestoneIndexSerializer, OutputId,
};
use keel_serialization::{DeserializeError, Deserializer, Serializer};
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Ledger manager: owns the spent/unspent bookkeeping of outputs, the
/// treasury singleton and the persisted ledger milestone index.
pub struct LedgerManager {
    store: Arc<dyn StoreController>,
    lock: RwLock<()>,
    index_serializer: MilestoneIndexSerializer,
    index_deserializer: MilestoneIndexDeserializer,
    output_serializer: OutputSerializer,
    output_deserializer: OutputDeserializer,
    spent_serializer: SpentSerializer,
    spent_deserializer: SpentDeserializer,
    treasury_key_serializer: TreasuryKeySerializer,
    treasury_serializer: TreasuryOutputSerializer,
    treasury_deserializer: TreasuryOutputDeserializer,
}

impl fmt::Debug for LedgerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerManager")
            .field("store", &self.store)
            .finish()
    }
}

impl LedgerManager {
    /// Creates a ledger manager on top of an opened store
    pub fn new(store: Arc<dyn StoreController>) -> Self {
        Self {
            store,
            lock: RwLock::new(()),
            index_serializer: MilestoneIndexSerializer::new(),
            index_deserializer: MilestoneIndexDeserializer::new(),
            output_serializer: OutputSerializer::new(),
            output_deserializer: OutputDeserializer::new(),
            spent_serializer: SpentSerializer::new(),
            spent_deserializer: SpentDeserializer::new(),
            treasury_key_serializer: TreasuryKeySerializer::new(),
            treasury_serializer: TreasuryOutputSerializer::new(),
            treasury_deserializer: TreasuryOutputDeserializer::new(),
        }
    }

    fn serialize_treasury(
        &self,
        output: &TreasuryOutput,
    ) -> Result<(Vec<u8>, Vec<u8>), LedgerError> {
        let mut key = Vec::new();
        self.treasury_key_serializer.serialize(&output.key(), &mut key)?;
        let mut value = Vec::new();
        self.treasury_serializer.serialize(output, &mut value)?;
        Ok((key, value))
    }

    fn serialize_index(&self, index: MilestoneIndex) -> Result<Vec<u8>, LedgerError> {
        let mut value = Vec::new();
        self.index_serializer.serialize(&index, &mut value)?;
        Ok(value)
    }

    /// Queues the creation of an output: its record plus its unspent marker
    fn batch_create_output(
        &self,
        batch: &mut DBBatch,
        output: &Output,
    ) -> Result<(), LedgerError> {
        let mut value = Vec::new();
        self.output_serializer.serialize(output, &mut value)?;
        batch.insert(output_key(&output.output_id), Some(value));
        batch.insert(unspent_output_key(&output.output_id), Some(Vec::new()));
        Ok(())
    }

    /// Queues the consumption of an output: the unspent marker moves out,
    /// a spent record moves in. The output record itself stays readable.
    fn batch_consume_output(
        &self,
        batch: &mut DBBatch,
        output: &Output,
        confirmation_index: MilestoneIndex,
    ) -> Result<(), LedgerError> {
        let spent = Spent {
            output: *output,
            confirmation_index,
        };
        let mut value = Vec::new();
        self.spent_serializer.serialize(&spent, &mut value)?;
        batch.insert(unspent_output_key(&output.output_id), None);
        batch.insert(spent_output_key(&output.output_id), Some(value));
        Ok(())
    }

    /// Queues the treasury transition: the new output lands in the
    /// unspent partition, the consumed one (if any) moves key-wise from
    /// the unspent to the spent partition.
    fn batch_treasury_change(
        &self,
        batch: &mut DBBatch,
        new_output: &TreasuryOutput,
        spent_output: Option<&TreasuryOutput>,
    ) -> Result<(), LedgerError> {
        let (key, value) = self.serialize_treasury(new_output)?;
        batch.insert(key, Some(value));
        if let Some(consumed) = spent_output {
            let mut old_key = Vec::new();
            self.treasury_key_serializer
                .serialize(&TreasuryKey::Unspent(consumed.milestone_id), &mut old_key)?;
            batch.insert(old_key, None);
            let spent = TreasuryOutput {
                spent: true,
                ..*consumed
            };
            let (key, value) = self.serialize_treasury(&spent)?;
            batch.insert(key, Some(value));
        }
        Ok(())
    }

    fn ledger_index_nolock(&self) -> Result<Option<MilestoneIndex>, LedgerError> {
        let Some(raw) = self.store.get(&ledger_index_key())? else {
            return Ok(None);
        };
        let (rest, index) = self
            .index_deserializer
            .deserialize::<DeserializeError>(&raw)
            .map_err(|e| LedgerError::CorruptRecord(format!("ledger index: {}", e)))?;
        if !rest.is_empty() {
            return Err(LedgerError::CorruptRecord(format!(
                "ledger index: {} trailing bytes",
                rest.len()
            )));
        }
        Ok(Some(index))
    }

    fn treasury_output_at(
        &self,
        key: &TreasuryKey,
    ) -> Result<Option<TreasuryOutput>, LedgerError> {
        let mut raw_key = Vec::new();
        self.treasury_key_serializer.serialize(key, &mut raw_key)?;
        match self.store.get(&raw_key)? {
            Some(value) => Ok(Some(
                self.treasury_deserializer
                    .deserialize_key_value(&raw_key, &value)?,
            )),
            None => Ok(None),
        }
    }

    /// Spend-flag transition: the old key leaves and the new key enters
    /// in the same atomic batch, since the flag lives in the key
    fn move_treasury_output(
        &self,
        output: &TreasuryOutput,
        spent: bool,
    ) -> Result<(), LedgerError> {
        let _guard = self.lock.write();
        let mut old_key = Vec::new();
        self.treasury_key_serializer.serialize(
            &if spent {
                TreasuryKey::Unspent(output.milestone_id)
            } else {
                TreasuryKey::Spent(output.milestone_id)
            },
            &mut old_key,
        )?;
        let moved = TreasuryOutput { spent, ..*output };
        let (new_key, value) = self.serialize_treasury(&moved)?;
        let mut batch = DBBatch::new();
        batch.insert(old_key, None);
        batch.insert(new_key, Some(value));
        self.store.write_batch(batch)?;
        Ok(())
    }

    /// Generic prefix scan: optional instance read lock, optional result
    /// cap, fused on the first error.
    fn scan<'a, T: 'a>(
        &'a self,
        prefix: &[u8],
        options: IterateOptions,
        decode: Box<dyn FnMut(&[u8], &[u8]) -> Result<T, LedgerError> + 'a>,
    ) -> LedgerIterator<'a, T> {
        let guard = options.read_lock_ledger.then(|| self.lock.read());
        Box::new(ScanIter {
            _guard: guard,
            inner: self.store.prefix_iterator(prefix),
            remaining: options.max_result_count,
            finished: false,
            decode,
        })
    }
}

impl LedgerController for LedgerManager {
    fn ledger_index(&self) -> Result<Option<MilestoneIndex>, LedgerError> {
        self.ledger_index_nolock()
    }

    fn apply_milestone(
        &self,
        index: MilestoneIndex,
        changes: &LedgerChanges,
    ) -> Result<(), LedgerError> {
        let _guard = self.lock.write();
        let mut batch = DBBatch::new();
        for output in &changes.created_outputs {
            self.batch_create_output(&mut batch, output)?;
        }
        for output in &changes.consumed_outputs {
            self.batch_consume_output(&mut batch, output, index)?;
        }
        if let Some(treasury) = &changes.treasury {
            self.batch_treasury_change(
                &mut batch,
                &treasury.new_output,
                treasury.spent_output.as_ref(),
            )?;
        }
        batch.insert(ledger_index_key().to_vec(), Some(self.serialize_index(index)?));
        self.store.write_batch(batch)?;
        debug!(
            "applied milestone {} to ledger: {} created, {} consumed, treasury: {}",
            index,
            changes.created_outputs.len(),
            changes.consumed_outputs.len(),
            changes.treasury.is_some()
        );
        Ok(())
    }

    fn rollback_milestone(
        &self,
        index: MilestoneIndex,
        changes: &LedgerChanges,
    ) -> Result<(), LedgerError> {
        let _guard = self.lock.write();
        match self.ledger_index_nolock()? {
            Some(current) if current == index => {}
            current => {
                return Err(LedgerError::InvalidRollback(format!(
                    "milestone {} is not the last applied milestone ({:?})",
                    index, current
                )))
            }
        }
        let mut batch = DBBatch::new();
        for output in &changes.created_outputs {
            batch.insert(output_key(&output.output_id), None);
            batch.insert(unspent_output_key(&output.output_id), None);
        }
        for output in &changes.consumed_outputs {
            batch.insert(spent_output_key(&output.output_id), None);
            batch.insert(unspent_output_key(&output.output_id), Some(Vec::new()));
        }
        if let Some(treasury) = &changes.treasury {
            let mut key = Vec::new();
            self.treasury_key_serializer.serialize(
                &TreasuryKey::Unspent(treasury.new_output.milestone_id),
                &mut key,
            )?;
            batch.insert(key, None);
            if let Some(consumed) = &treasury.spent_output {
                let mut key = Vec::new();
                self.treasury_key_serializer
                    .serialize(&TreasuryKey::Spent(consumed.milestone_id), &mut key)?;
                batch.insert(key, None);
                let unspent = TreasuryOutput {
                    spent: false,
                    ..*consumed
                };
                let (key, value) = self.serialize_treasury(&unspent)?;
                batch.insert(key, Some(value));
            }
        }
        batch.insert(
            ledger_index_key().to_vec(),
            Some(self.serialize_index(index.previous())?),
        );
        self.store.write_batch(batch)?;
        debug!("rolled back milestone {} from ledger", index);
        Ok(())
    }

    fn output(&self, output_id: &OutputId) -> Result<Option<Output>, LedgerError> {
        let key = output_key(output_id);
        match self.store.get(&key)? {
            Some(value) => Ok(Some(
                self.output_deserializer.deserialize_key_value(&key, &value)?,
            )),
            None => Ok(None),
        }
    }

    fn is_output_unspent(&self, output_id: &OutputId) -> Result<bool, LedgerError> {
        Ok(self.store.get(&unspent_output_key(output_id))?.is_some())
    }

    fn spent_output(&self, output_id: &OutputId) -> Result<Option<Spent>, LedgerError> {
        let key = spent_output_key(output_id);
        let Some(value) = self.store.get(&key)? else {
            return Ok(None);
        };
        let (_, confirmation_index) =
            self.spent_deserializer.deserialize_key_value(&key, &value)?;
        let output = self.output(output_id)?.ok_or_else(|| {
            LedgerError::CorruptRecord(format!(
                "spent record without output record: {}",
                output_id
            ))
        })?;
        Ok(Some(Spent {
            output,
            confirmation_index,
        }))
    }

    fn add_treasury_output(&self, output: &TreasuryOutput) -> Result<(), LedgerError> {
        let (key, value) = self.serialize_treasury(output)?;
        self.store.set(&key, &value)?;
        debug!(
            "added {} treasury output {} with amount {}",
            if output.spent { "spent" } else { "unspent" },
            output.milestone_id,
            output.amount
        );
        Ok(())
    }

    fn delete_treasury_output(&self, output: &TreasuryOutput) -> Result<(), LedgerError> {
        let mut key = Vec::new();
        self.treasury_key_serializer.serialize(&output.key(), &mut key)?;
        self.store.delete(&key)?;
        Ok(())
    }

    fn read_lock_ledger(&self) -> LedgerReadGuard<'_> {
        LedgerReadGuard::new(self.lock.read())
    }

    fn mark_treasury_output_spent(&self, output: &TreasuryOutput) -> Result<(), LedgerError> {
        self.move_treasury_output(output, true)
    }

    fn mark_treasury_output_unspent(&self, output: &TreasuryOutput) -> Result<(), LedgerError> {
        self.move_treasury_output(output, false)
    }

    fn unspent_treasury_output(&self) -> Result<TreasuryOutput, LedgerError> {
        let _guard = self.lock.read();
        let prefix = unspent_treasury_prefix();
        let mut iter = self.store.prefix_iterator(&prefix);
        let Some(first) = iter.next().transpose()? else {
            return Err(LedgerError::InvalidTreasuryState(
                "no treasury output exists".into(),
            ));
        };
        if iter.next().transpose()?.is_some() {
            return Err(LedgerError::InvalidTreasuryState(
                "more than one unspent treasury output exists".into(),
            ));
        }
        self.treasury_deserializer
            .deserialize_key_value(&first.0, &first.1)
    }

    fn spent_treasury_output(
        &self,
        milestone_id: &MilestoneId,
    ) -> Result<Option<TreasuryOutput>, LedgerError> {
        self.treasury_output_at(&TreasuryKey::Spent(*milestone_id))
    }

    fn unspent_treasury_output_for(
        &self,
        milestone_id: &MilestoneId,
    ) -> Result<Option<TreasuryOutput>, LedgerError> {
        self.treasury_output_at(&TreasuryKey::Unspent(*milestone_id))
    }

    fn treasury_outputs(&self, options: IterateOptions) -> LedgerIterator<'_, TreasuryOutput> {
        let deserializer = self.treasury_deserializer.clone();
        self.scan(
            &treasury_prefix(),
            options,
            Box::new(move |key, value| deserializer.deserialize_key_value(key, value)),
        )
    }

    fn spent_treasury_outputs(
        &self,
        options: IterateOptions,
    ) -> LedgerIterator<'_, TreasuryOutput> {
        let deserializer = self.treasury_deserializer.clone();
        self.scan(
            &spent_treasury_prefix(),
            options,
            Box::new(move |key, value| deserializer.deserialize_key_value(key, value)),
        )
    }

    fn unspent_outputs(&self, options: IterateOptions) -> LedgerIterator<'_, Output> {
        let store = Arc::clone(&self.store);
        let deserializer = self.output_deserializer.clone();
        self.scan(
            &[OUTPUT_UNSPENT_PREFIX],
            options,
            Box::new(move |key, _value| {
                // marker value is empty; the record lives in the output namespace
                let id_bytes = key.get(1..).ok_or_else(|| {
                    LedgerError::CorruptRecord("unspent marker key too short".into())
                })?;
                let output_id = OutputId::try_from(id_bytes)?;
                let record_key = output_key(&output_id);
                let value = store.get(&record_key)?.ok_or_else(|| {
                    LedgerError::CorruptRecord(format!(
                        "unspent marker without output record: {}",
                        output_id
                    ))
                })?;
                deserializer.deserialize_key_value(&record_key, &value)
            }),
        )
    }
}

struct ScanIter<'a, T> {
    _guard: Option<RwLockReadGuard<'a, ()>>,
    inner: StoreIterator<'a>,
    remaining: Option<usize>,
    finished: bool,
    decode: Box<dyn FnMut(&[u8], &[u8]) -> Result<T, LedgerError> + 'a>,
}

impl<T> Iterator for ScanIter<'_, T> {
    type Item = Result<T, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.remaining == Some(0) {
            self.finished = true;
            return None;
        }
        match self.inner.next() {
            None => {
                self.finished = true;
                None
            }
            Some(Err(e)) => {
                self.finished = true;
                Some(Err(e.into()))
            }
            Some(Ok((key, value))) => match (self.decode)(&key, &value) {
                Ok(item) => {
                    if let Some(remaining) = self.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    Some(Ok(item))
                }
                Err(e) => {
                    self.finished = true;
                    Some(Err(e))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use keel_db_exports::StoreError;
    use keel_db_worker::MemStore;
    use keel_ledger_exports::TreasuryChange;
    use keel_models::{Address, ADDRESS_LENGTH, MILESTONE_ID_LENGTH, OUTPUT_ID_LENGTH};

    fn manager() -> LedgerManager {
        LedgerManager::new(Arc::new(MemStore::new()))
    }

    fn output(id_byte: u8, amount: u64) -> Output {
        Output {
            output_id: OutputId::new([id_byte; OUTPUT_ID_LENGTH]),
            address: Address::new([0x11; ADDRESS_LENGTH]),
            amount,
        }
    }

    fn treasury(id_byte: u8, amount: u64, spent: bool) -> TreasuryOutput {
        TreasuryOutput {
            milestone_id: MilestoneId::new([id_byte; MILESTONE_ID_LENGTH]),
            amount,
            spent,
        }
    }

    fn created(outputs: Vec<Output>) -> LedgerChanges {
        LedgerChanges {
            created_outputs: outputs,
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_store_has_no_ledger_index() {
        assert_eq!(manager().ledger_index().unwrap(), None);
    }

    #[test]
    fn test_apply_milestone_records_outputs_and_index() {
        let ledger = manager();
        let o1 = output(1, 100);
        ledger
            .apply_milestone(MilestoneIndex(7), &created(vec![o1]))
            .unwrap();
        assert_eq!(ledger.ledger_index().unwrap(), Some(MilestoneIndex(7)));
        assert_eq!(ledger.output(&o1.output_id).unwrap(), Some(o1));
        assert!(ledger.is_output_unspent(&o1.output_id).unwrap());
        assert_eq!(ledger.spent_output(&o1.output_id).unwrap(), None);
    }

    #[test]
    fn test_spend_transitions_markers() {
        let ledger = manager();
        let o1 = output(1, 100);
        ledger
            .apply_milestone(MilestoneIndex(1), &created(vec![o1]))
            .unwrap();
        let changes = LedgerChanges {
            consumed_outputs: vec![o1],
            ..Default::default()
        };
        ledger.apply_milestone(MilestoneIndex(2), &changes).unwrap();

        assert!(!ledger.is_output_unspent(&o1.output_id).unwrap());
        let spent = ledger.spent_output(&o1.output_id).unwrap().unwrap();
        assert_eq!(spent.output, o1);
        assert_eq!(spent.confirmation_index, MilestoneIndex(2));
        // the output record itself survives consumption
        assert_eq!(ledger.output(&o1.output_id).unwrap(), Some(o1));
    }

    /// Delegates to an in-memory store but ends every prefix scan with
    /// an I/O error, as a disk failing mid-iteration would.
    #[derive(Debug)]
    struct ScanFailStore(MemStore);

    impl StoreController for ScanFailStore {
        fn engine(&self) -> &'static str {
            "memory"
        }

        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.0.get(key)
        }

        fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
            self.0.set(key, value)
        }

        fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
            self.0.delete(key)
        }

        fn prefix_iterator<'a>(&'a self, prefix: &[u8]) -> StoreIterator<'a> {
            Box::new(self.0.prefix_iterator(prefix).chain(std::iter::once(Err(
                StoreError::OperationError("disk read failed".into()),
            ))))
        }

        fn write_batch(&self, batch: DBBatch) -> Result<(), StoreError> {
            self.0.write_batch(batch)
        }

        fn flush(&self) -> Result<(), StoreError> {
            self.0.flush()
        }

        fn close(&self) -> Result<(), StoreError> {
            self.0.close()
        }

        fn supports_cleanup(&self) -> bool {
            false
        }

        fn cleanup(&self) -> Result<(), StoreError> {
            Err(StoreError::NothingToCleanUp)
        }
    }

    #[test]
    fn test_scan_error_is_not_treasury_corruption() {
        let ledger = LedgerManager::new(Arc::new(ScanFailStore(MemStore::new())));
        ledger.add_treasury_output(&treasury(1, 500, false)).unwrap();
        // one output is present; the scan error after it must surface as
        // a store error, not as a singleton violation
        assert_matches!(
            ledger.unspent_treasury_output(),
            Err(LedgerError::StoreError(StoreError::OperationError(_)))
        );
    }

    #[test]
    fn test_unspent_treasury_requires_exactly_one() {
        let ledger = manager();
        assert_matches!(
            ledger.unspent_treasury_output(),
            Err(LedgerError::InvalidTreasuryState(msg)) if msg == "no treasury output exists"
        );

        ledger.add_treasury_output(&treasury(1, 500, false)).unwrap();
        assert_eq!(ledger.unspent_treasury_output().unwrap(), treasury(1, 500, false));

        ledger.add_treasury_output(&treasury(2, 600, false)).unwrap();
        assert_matches!(
            ledger.unspent_treasury_output(),
            Err(LedgerError::InvalidTreasuryState(msg))
                if msg == "more than one unspent treasury output exists"
        );
    }

    #[test]
    fn test_treasury_transition_moves_partitions() {
        let ledger = manager();
        let old = treasury(1, 500, false);
        ledger.add_treasury_output(&old).unwrap();

        let new = treasury(2, 450, false);
        let changes = LedgerChanges {
            treasury: Some(TreasuryChange {
                new_output: new,
                spent_output: Some(old),
            }),
            ..Default::default()
        };
        ledger.apply_milestone(MilestoneIndex(3), &changes).unwrap();

        assert_eq!(ledger.unspent_treasury_output().unwrap(), new);
        let spent = ledger
            .spent_treasury_output(&old.milestone_id)
            .unwrap()
            .unwrap();
        assert!(spent.spent);
        assert_eq!(spent.amount, old.amount);
        assert_eq!(
            ledger.spent_treasury_output(&new.milestone_id).unwrap(),
            None
        );
    }

    #[test]
    fn test_normal_spend_scenario() {
        let ledger = manager();
        let t = treasury(1, 1000, false);
        ledger.add_treasury_output(&t).unwrap();

        ledger.mark_treasury_output_spent(&t).unwrap();

        assert_matches!(
            ledger.unspent_treasury_output(),
            Err(LedgerError::InvalidTreasuryState(msg)) if msg == "no treasury output exists"
        );
        let spent: Vec<_> = ledger
            .spent_treasury_outputs(IterateOptions::default())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            spent,
            vec![TreasuryOutput {
                spent: true,
                ..t
            }]
        );
    }

    #[test]
    fn test_mark_unspent_reverses_mark_spent() {
        let ledger = manager();
        let t = treasury(1, 1000, false);
        ledger.add_treasury_output(&t).unwrap();
        ledger.mark_treasury_output_spent(&t).unwrap();
        ledger
            .mark_treasury_output_unspent(&treasury(1, 1000, true))
            .unwrap();

        assert_eq!(ledger.unspent_treasury_output().unwrap(), t);
        assert_eq!(ledger.spent_treasury_output(&t.milestone_id).unwrap(), None);
    }

    #[test]
    fn test_spend_transition_is_a_key_move() {
        let store = Arc::new(MemStore::new());
        let ledger = LedgerManager::new(Arc::clone(&store) as Arc<dyn StoreController>);
        let t = treasury(1, 1000, false);
        ledger.add_treasury_output(&t).unwrap();
        ledger.mark_treasury_output_spent(&t).unwrap();

        let mut unspent_key = unspent_treasury_prefix().to_vec();
        unspent_key.extend_from_slice(t.milestone_id.to_bytes());
        let mut spent_key = spent_treasury_prefix().to_vec();
        spent_key.extend_from_slice(t.milestone_id.to_bytes());
        assert_eq!(store.get(&unspent_key).unwrap(), None);
        assert_eq!(
            store.get(&spent_key).unwrap(),
            Some(1000u64.to_be_bytes().to_vec())
        );
    }

    #[test]
    fn test_delete_treasury_output() {
        let ledger = manager();
        let t = treasury(1, 500, false);
        ledger.add_treasury_output(&t).unwrap();
        ledger.delete_treasury_output(&t).unwrap();
        assert_matches!(
            ledger.unspent_treasury_output(),
            Err(LedgerError::InvalidTreasuryState(_))
        );
        // deleting an absent output is not an error
        ledger.delete_treasury_output(&t).unwrap();
    }

    #[test]
    fn test_rollback_inverts_apply() {
        let ledger = manager();
        let o1 = output(1, 100);
        let o2 = output(2, 40);
        let old_treasury = treasury(1, 500, false);
        ledger.add_treasury_output(&old_treasury).unwrap();
        ledger
            .apply_milestone(MilestoneIndex(1), &created(vec![o1]))
            .unwrap();

        let changes = LedgerChanges {
            created_outputs: vec![o2],
            consumed_outputs: vec![o1],
            treasury: Some(TreasuryChange {
                new_output: treasury(2, 450, false),
                spent_output: Some(old_treasury),
            }),
        };
        ledger.apply_milestone(MilestoneIndex(2), &changes).unwrap();
        ledger
            .rollback_milestone(MilestoneIndex(2), &changes)
            .unwrap();

        assert_eq!(ledger.ledger_index().unwrap(), Some(MilestoneIndex(1)));
        assert!(ledger.is_output_unspent(&o1.output_id).unwrap());
        assert_eq!(ledger.spent_output(&o1.output_id).unwrap(), None);
        assert_eq!(ledger.output(&o2.output_id).unwrap(), None);
        assert!(!ledger.is_output_unspent(&o2.output_id).unwrap());
        assert_eq!(ledger.unspent_treasury_output().unwrap(), old_treasury);
        assert_eq!(
            ledger
                .spent_treasury_output(&old_treasury.milestone_id)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_rollback_rejects_index_mismatch() {
        let ledger = manager();
        let changes = created(vec![output(1, 100)]);
        ledger.apply_milestone(MilestoneIndex(5), &changes).unwrap();
        assert_matches!(
            ledger.rollback_milestone(MilestoneIndex(4), &changes),
            Err(LedgerError::InvalidRollback(_))
        );
    }

    #[test]
    fn test_unspent_outputs_iteration() {
        let ledger = manager();
        let outputs = vec![output(1, 10), output(2, 20), output(3, 30)];
        ledger
            .apply_milestone(MilestoneIndex(1), &created(outputs.clone()))
            .unwrap();
        ledger
            .apply_milestone(
                MilestoneIndex(2),
                &LedgerChanges {
                    consumed_outputs: vec![outputs[1]],
                    ..Default::default()
                },
            )
            .unwrap();

        let collected: Result<Vec<_>, _> = ledger
            .unspent_outputs(IterateOptions::default().with_read_lock(false))
            .collect();
        let collected = collected.unwrap();
        assert_eq!(collected, vec![outputs[0], outputs[2]]);
    }

    #[test]
    fn test_locked_iterator_blocks_writers() {
        let ledger = manager();
        ledger.add_treasury_output(&treasury(1, 100, false)).unwrap();

        let iter = ledger.treasury_outputs(IterateOptions::default());
        assert!(ledger.lock.try_write().is_none());
        drop(iter);
        assert!(ledger.lock.try_write().is_some());

        let iter = ledger.treasury_outputs(IterateOptions::default().with_read_lock(false));
        assert!(ledger.lock.try_write().is_some());
        drop(iter);
    }

    #[test]
    fn test_read_guard_blocks_writers() {
        let ledger = manager();
        let guard = ledger.read_lock_ledger();
        assert!(ledger.lock.try_write().is_none());
        drop(guard);
        assert!(ledger.lock.try_write().is_some());
    }

    #[test]
    fn test_unspent_point_lookup() {
        let ledger = manager();
        let t = treasury(1, 500, false);
        ledger.add_treasury_output(&t).unwrap();
        assert_eq!(
            ledger.unspent_treasury_output_for(&t.milestone_id).unwrap(),
            Some(t)
        );

        ledger.mark_treasury_output_spent(&t).unwrap();
        assert_eq!(
            ledger.unspent_treasury_output_for(&t.milestone_id).unwrap(),
            None
        );
        assert_matches!(
            ledger.spent_treasury_output(&t.milestone_id).unwrap(),
            Some(TreasuryOutput { spent: true, .. })
        );
    }

    #[test]
    fn test_iteration_respects_max_result_count() {
        let ledger = manager();
        for byte in 1..=5 {
            ledger.add_treasury_output(&treasury(byte, 100, true)).unwrap();
        }
        let collected: Result<Vec<_>, _> = ledger
            .spent_treasury_outputs(IterateOptions::new().with_max_result_count(2))
            .collect();
        assert_eq!(collected.unwrap().len(), 2);
    }

    #[test]
    fn test_treasury_scan_covers_both_partitions() {
        let ledger = manager();
        ledger.add_treasury_output(&treasury(1, 100, true)).unwrap();
        ledger.add_treasury_output(&treasury(2, 200, false)).unwrap();

        let all: Result<Vec<_>, _> = ledger
            .treasury_outputs(IterateOptions::default())
            .collect();
        assert_eq!(all.unwrap().len(), 2);

        let spent: Result<Vec<_>, _> = ledger
            .spent_treasury_outputs(IterateOptions::default())
            .collect();
        let spent = spent.unwrap();
        assert_eq!(spent.len(), 1);
        assert!(spent[0].spent);
    }

    #[test]
    fn test_corrupt_record_fuses_iteration() {
        let store = Arc::new(MemStore::new());
        let ledger = LedgerManager::new(Arc::clone(&store) as Arc<dyn StoreController>);
        ledger.add_treasury_output(&treasury(1, 100, true)).unwrap();
        // a value of the wrong width in the spent partition
        let mut bad_key = spent_treasury_prefix().to_vec();
        bad_key.extend_from_slice(&[0u8; MILESTONE_ID_LENGTH]);
        store.set(&bad_key, &[1, 2, 3]).unwrap();

        let mut iter = ledger.spent_treasury_outputs(IterateOptions::default());
        assert_matches!(iter.next(), Some(Err(LedgerError::CorruptRecord(_))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_apply_is_atomic_per_milestone() {
        let store = Arc::new(MemStore::new());
        let ledger = LedgerManager::new(Arc::clone(&store) as Arc<dyn StoreController>);
        let o1 = output(1, 100);
        ledger
            .apply_milestone(MilestoneIndex(1), &created(vec![o1]))
            .unwrap();
        // marker transition happened in the same batch as the index bump
        assert_eq!(ledger.ledger_index().unwrap(), Some(MilestoneIndex(1)));
        assert_eq!(
            store.get(&unspent_output_key(&o1.output_id)).unwrap(),
            Some(Vec::new())
        );
    }
}

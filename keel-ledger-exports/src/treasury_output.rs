// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::{LedgerError, TreasuryKey, TreasuryKeyDeserializer};
use keel_models::MilestoneId;
use keel_serialization::{
    DeserializeError, Deserializer, SerializeError, Serializer, U64BEDeserializer, U64BESerializer,
};

/// A treasury output: protocol-held funds produced by a milestone.
///
/// At most one treasury output with `spent == false` may exist in the
/// store at any time; the ledger manager enforces this when querying and
/// transitions the flag only through atomic key moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreasuryOutput {
    /// id of the milestone which generated this output
    pub milestone_id: MilestoneId,
    /// amount residing on this output
    pub amount: u64,
    /// whether this output was already spent
    pub spent: bool,
}

impl TreasuryOutput {
    /// Store key of this output, picking the partition from the spend flag
    pub const fn key(&self) -> TreasuryKey {
        if self.spent {
            TreasuryKey::Spent(self.milestone_id)
        } else {
            TreasuryKey::Unspent(self.milestone_id)
        }
    }
}

/// Serializer for the value bytes of a `TreasuryOutput`
/// (the key is serialized separately by `TreasuryKeySerializer`)
#[derive(Clone, Default)]
pub struct TreasuryOutputSerializer {
    amount_serializer: U64BESerializer,
}

impl TreasuryOutputSerializer {
    /// Creates a new `TreasuryOutputSerializer`
    pub const fn new() -> Self {
        Self {
            amount_serializer: U64BESerializer::new(),
        }
    }
}

impl Serializer<TreasuryOutput> for TreasuryOutputSerializer {
    fn serialize(
        &self,
        value: &TreasuryOutput,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.amount_serializer.serialize(&value.amount, buffer)
    }
}

/// Rebuilds a `TreasuryOutput` from a stored key/value pair, validating
/// structural length on both sides before interpreting any byte.
#[derive(Clone, Default)]
pub struct TreasuryOutputDeserializer {
    key_deserializer: TreasuryKeyDeserializer,
    amount_deserializer: U64BEDeserializer,
}

impl TreasuryOutputDeserializer {
    /// Creates a new `TreasuryOutputDeserializer`
    pub const fn new() -> Self {
        Self {
            key_deserializer: TreasuryKeyDeserializer::new(),
            amount_deserializer: U64BEDeserializer::new(),
        }
    }

    /// Decodes a stored `(key, value)` pair. Trailing bytes on either
    /// side are treated as corruption, not ignored.
    pub fn deserialize_key_value(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<TreasuryOutput, LedgerError> {
        let (rest, treasury_key) = self
            .key_deserializer
            .deserialize::<DeserializeError>(key)
            .map_err(|e| LedgerError::CorruptRecord(format!("treasury key: {}", e)))?;
        if !rest.is_empty() {
            return Err(LedgerError::CorruptRecord(format!(
                "treasury key: {} trailing bytes",
                rest.len()
            )));
        }
        let (rest, amount) = self
            .amount_deserializer
            .deserialize::<DeserializeError>(value)
            .map_err(|e| LedgerError::CorruptRecord(format!("treasury amount: {}", e)))?;
        if !rest.is_empty() {
            return Err(LedgerError::CorruptRecord(format!(
                "treasury amount: {} trailing bytes",
                rest.len()
            )));
        }
        Ok(TreasuryOutput {
            milestone_id: *treasury_key.milestone_id(),
            amount,
            spent: treasury_key.is_spent(),
        })
    }
}

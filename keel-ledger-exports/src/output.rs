// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::{LedgerError, OUTPUT_PREFIX, OUTPUT_SPENT_PREFIX};
use keel_models::{
    Address, AddressDeserializer, AddressSerializer, MilestoneIndex, MilestoneIndexDeserializer,
    MilestoneIndexSerializer, OutputId, OutputIdDeserializer,
};
use keel_serialization::{
    DeserializeError, Deserializer, SerializeError, Serializer, U64BEDeserializer, U64BESerializer,
};

/// A transaction output held in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    /// identifier of the output
    pub output_id: OutputId,
    /// address owning the funds
    pub address: Address,
    /// amount residing on this output
    pub amount: u64,
}

/// An output together with the milestone that consumed it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spent {
    /// the consumed output
    pub output: Output,
    /// index of the milestone whose confirmation consumed the output
    pub confirmation_index: MilestoneIndex,
}

/// Serializer for the value bytes of an `Output`
/// (the output id lives in the key, written by `output_key`)
#[derive(Clone, Default)]
pub struct OutputSerializer {
    address_serializer: AddressSerializer,
    amount_serializer: U64BESerializer,
}

impl OutputSerializer {
    /// Creates a new `OutputSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            amount_serializer: U64BESerializer::new(),
        }
    }
}

impl Serializer<Output> for OutputSerializer {
    fn serialize(&self, value: &Output, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.address, buffer)?;
        self.amount_serializer.serialize(&value.amount, buffer)
    }
}

/// Rebuilds an `Output` from a stored key/value pair
#[derive(Clone, Default)]
pub struct OutputDeserializer {
    id_deserializer: OutputIdDeserializer,
    address_deserializer: AddressDeserializer,
    amount_deserializer: U64BEDeserializer,
}

impl OutputDeserializer {
    /// Creates a new `OutputDeserializer`
    pub const fn new() -> Self {
        Self {
            id_deserializer: OutputIdDeserializer::new(),
            address_deserializer: AddressDeserializer::new(),
            amount_deserializer: U64BEDeserializer::new(),
        }
    }

    /// Decodes a stored `(key, value)` pair from the output namespace.
    /// Trailing bytes on either side are treated as corruption.
    pub fn deserialize_key_value(&self, key: &[u8], value: &[u8]) -> Result<Output, LedgerError> {
        let output_id = deserialize_output_id(&self.id_deserializer, OUTPUT_PREFIX, key)?;
        let (rest, address) = self
            .address_deserializer
            .deserialize::<DeserializeError>(value)
            .map_err(|e| LedgerError::CorruptRecord(format!("output address: {}", e)))?;
        let (rest, amount) = self
            .amount_deserializer
            .deserialize::<DeserializeError>(rest)
            .map_err(|e| LedgerError::CorruptRecord(format!("output amount: {}", e)))?;
        if !rest.is_empty() {
            return Err(LedgerError::CorruptRecord(format!(
                "output value: {} trailing bytes",
                rest.len()
            )));
        }
        Ok(Output {
            output_id,
            address,
            amount,
        })
    }
}

/// Serializer for the value bytes of a spent record
/// (only the confirmation index is stored; the output itself stays in
/// the output namespace and is joined back at read time)
#[derive(Clone, Default)]
pub struct SpentSerializer {
    index_serializer: MilestoneIndexSerializer,
}

impl SpentSerializer {
    /// Creates a new `SpentSerializer`
    pub const fn new() -> Self {
        Self {
            index_serializer: MilestoneIndexSerializer::new(),
        }
    }
}

impl Serializer<Spent> for SpentSerializer {
    fn serialize(&self, value: &Spent, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.index_serializer
            .serialize(&value.confirmation_index, buffer)
    }
}

/// Decodes a spent record into the consumed output id and the
/// confirmation index stored with it
#[derive(Clone, Default)]
pub struct SpentDeserializer {
    id_deserializer: OutputIdDeserializer,
    index_deserializer: MilestoneIndexDeserializer,
}

impl SpentDeserializer {
    /// Creates a new `SpentDeserializer`
    pub const fn new() -> Self {
        Self {
            id_deserializer: OutputIdDeserializer::new(),
            index_deserializer: MilestoneIndexDeserializer::new(),
        }
    }

    /// Decodes a stored `(key, value)` pair from the spent namespace
    pub fn deserialize_key_value(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<(OutputId, MilestoneIndex), LedgerError> {
        let output_id = deserialize_output_id(&self.id_deserializer, OUTPUT_SPENT_PREFIX, key)?;
        let (rest, index) = self
            .index_deserializer
            .deserialize::<DeserializeError>(value)
            .map_err(|e| LedgerError::CorruptRecord(format!("spent confirmation index: {}", e)))?;
        if !rest.is_empty() {
            return Err(LedgerError::CorruptRecord(format!(
                "spent value: {} trailing bytes",
                rest.len()
            )));
        }
        Ok((output_id, index))
    }
}

fn deserialize_output_id(
    id_deserializer: &OutputIdDeserializer,
    prefix: u8,
    key: &[u8],
) -> Result<OutputId, LedgerError> {
    let rest = match key.split_first() {
        Some((&first, rest)) if first == prefix => rest,
        _ => {
            return Err(LedgerError::CorruptRecord(format!(
                "output key: missing {:#04x} namespace prefix",
                prefix
            )))
        }
    };
    let (rest, output_id) = id_deserializer
        .deserialize::<DeserializeError>(rest)
        .map_err(|e| LedgerError::CorruptRecord(format!("output key: {}", e)))?;
    if !rest.is_empty() {
        return Err(LedgerError::CorruptRecord(format!(
            "output key: {} trailing bytes",
            rest.len()
        )));
    }
    Ok(output_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{output_key, spent_output_key};
    use keel_models::{ADDRESS_LENGTH, OUTPUT_ID_LENGTH};

    fn output(id_byte: u8) -> Output {
        Output {
            output_id: OutputId::new([id_byte; OUTPUT_ID_LENGTH]),
            address: Address::new([0x42; ADDRESS_LENGTH]),
            amount: 1_000_000,
        }
    }

    #[test]
    fn test_output_round_trip() {
        let output = output(5);
        let key = output_key(&output.output_id);
        let mut value = Vec::new();
        OutputSerializer::new().serialize(&output, &mut value).unwrap();
        assert_eq!(value.len(), ADDRESS_LENGTH + 8);
        let decoded = OutputDeserializer::new()
            .deserialize_key_value(&key, &value)
            .unwrap();
        assert_eq!(decoded, output);
    }

    #[test]
    fn test_output_rejects_wrong_namespace() {
        let output = output(5);
        let key = spent_output_key(&output.output_id);
        let mut value = Vec::new();
        OutputSerializer::new().serialize(&output, &mut value).unwrap();
        assert!(matches!(
            OutputDeserializer::new().deserialize_key_value(&key, &value),
            Err(LedgerError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_output_rejects_truncated_value() {
        let output = output(5);
        let key = output_key(&output.output_id);
        let mut value = Vec::new();
        OutputSerializer::new().serialize(&output, &mut value).unwrap();
        assert!(matches!(
            OutputDeserializer::new().deserialize_key_value(&key, &value[..value.len() - 1]),
            Err(LedgerError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_spent_round_trip() {
        let spent = Spent {
            output: output(9),
            confirmation_index: MilestoneIndex(77),
        };
        let key = spent_output_key(&spent.output.output_id);
        let mut value = Vec::new();
        SpentSerializer::new().serialize(&spent, &mut value).unwrap();
        assert_eq!(value.len(), 4);
        let (id, index) = SpentDeserializer::new()
            .deserialize_key_value(&key, &value)
            .unwrap();
        assert_eq!(id, spent.output.output_id);
        assert_eq!(index, spent.confirmation_index);
    }

    #[test]
    fn test_spent_rejects_trailing_bytes() {
        let spent = Spent {
            output: output(9),
            confirmation_index: MilestoneIndex(77),
        };
        let key = spent_output_key(&spent.output.output_id);
        let mut value = Vec::new();
        SpentSerializer::new().serialize(&spent, &mut value).unwrap();
        value.push(0);
        assert!(matches!(
            SpentDeserializer::new().deserialize_key_value(&key, &value),
            Err(LedgerError::CorruptRecord(_))
        ));
    }
}

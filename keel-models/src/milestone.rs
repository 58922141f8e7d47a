// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::ModelsError;
use keel_serialization::{Deserializer, SerializeError, Serializer, U32BEDeserializer, U32BESerializer};
use keel_time::KeelTime;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use std::fmt;

/// Fixed byte length of a milestone identifier
pub const MILESTONE_ID_LENGTH: usize = 32;

/// Identifier of the milestone that produced a record.
/// Fixed-length, copied verbatim to and from disk.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct MilestoneId([u8; MILESTONE_ID_LENGTH]);

impl MilestoneId {
    /// Wraps raw bytes into a `MilestoneId`
    pub const fn new(bytes: [u8; MILESTONE_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Underlying byte representation
    pub const fn to_bytes(&self) -> &[u8; MILESTONE_ID_LENGTH] {
        &self.0
    }
}

impl TryFrom<&[u8]> for MilestoneId {
    type Error = ModelsError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; MILESTONE_ID_LENGTH] =
            value.try_into().map_err(|_| ModelsError::InvalidIdLength {
                got: value.len(),
                expected: MILESTONE_ID_LENGTH,
            })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Serializer for `MilestoneId`
#[derive(Clone, Default)]
pub struct MilestoneIdSerializer;

impl MilestoneIdSerializer {
    /// Creates a new `MilestoneIdSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<MilestoneId> for MilestoneIdSerializer {
    fn serialize(&self, value: &MilestoneId, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `MilestoneId`
#[derive(Clone, Default)]
pub struct MilestoneIdDeserializer;

impl MilestoneIdDeserializer {
    /// Creates a new `MilestoneIdDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<MilestoneId> for MilestoneIdDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MilestoneId, E> {
        context("Failed MilestoneId deserialization", |input: &'a [u8]| {
            let (rest, bytes) = take(MILESTONE_ID_LENGTH)(input)?;
            // take() guarantees the exact length
            let id = MilestoneId::new(bytes.try_into().unwrap());
            Ok((rest, id))
        })(buffer)
    }
}

/// Index of a milestone in the confirmation sequence
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct MilestoneIndex(pub u32);

impl MilestoneIndex {
    /// Creates a new `MilestoneIndex`
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index of the previous milestone, saturating at zero
    #[must_use]
    pub const fn previous(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for MilestoneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializer for `MilestoneIndex`, fixed 4-byte big-endian
#[derive(Clone, Default)]
pub struct MilestoneIndexSerializer {
    u32_serializer: U32BESerializer,
}

impl MilestoneIndexSerializer {
    /// Creates a new `MilestoneIndexSerializer`
    pub const fn new() -> Self {
        Self {
            u32_serializer: U32BESerializer::new(),
        }
    }
}

impl Serializer<MilestoneIndex> for MilestoneIndexSerializer {
    fn serialize(
        &self,
        value: &MilestoneIndex,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.u32_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `MilestoneIndex`
#[derive(Clone, Default)]
pub struct MilestoneIndexDeserializer {
    u32_deserializer: U32BEDeserializer,
}

impl MilestoneIndexDeserializer {
    /// Creates a new `MilestoneIndexDeserializer`
    pub const fn new() -> Self {
        Self {
            u32_deserializer: U32BEDeserializer::new(),
        }
    }
}

impl Deserializer<MilestoneIndex> for MilestoneIndexDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MilestoneIndex, E> {
        context("Failed MilestoneIndex deserialization", |input| {
            self.u32_deserializer
                .deserialize(input)
                .map(|(rest, index)| (rest, MilestoneIndex(index)))
        })(buffer)
    }
}

/// A confirmed milestone as seen by freshness consumers: its index in the
/// confirmation sequence and the timestamp it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneRecord {
    /// confirmation index
    pub index: MilestoneIndex,
    /// timestamp carried by the milestone
    pub timestamp: KeelTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_serialization::DeserializeError;

    #[test]
    fn test_milestone_id_round_trip() {
        let id = MilestoneId::new([7u8; MILESTONE_ID_LENGTH]);
        let mut buffer = Vec::new();
        MilestoneIdSerializer::new().serialize(&id, &mut buffer).unwrap();
        assert_eq!(buffer.len(), MILESTONE_ID_LENGTH);
        let (rest, out) = MilestoneIdDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, id);
    }

    #[test]
    fn test_milestone_id_rejects_short_input() {
        assert!(MilestoneIdDeserializer::new()
            .deserialize::<DeserializeError>(&[0u8; MILESTONE_ID_LENGTH - 1])
            .is_err());
        assert!(MilestoneId::try_from(&[0u8; 5][..]).is_err());
    }

    #[test]
    fn test_milestone_index_previous_saturates() {
        assert_eq!(MilestoneIndex(5).previous(), MilestoneIndex(4));
        assert_eq!(MilestoneIndex(0).previous(), MilestoneIndex(0));
    }

    #[test]
    fn test_milestone_index_round_trip() {
        let index = MilestoneIndex(123_456);
        let mut buffer = Vec::new();
        MilestoneIndexSerializer::new()
            .serialize(&index, &mut buffer)
            .unwrap();
        let (rest, out) = MilestoneIndexDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, index);
    }
}

// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use crate::ModelsError;
use keel_serialization::{Deserializer, SerializeError, Serializer};
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use std::fmt;

/// Fixed byte length of an output identifier
/// (32-byte transaction id followed by a 2-byte output index)
pub const OUTPUT_ID_LENGTH: usize = 34;

/// Fixed byte length of an address
pub const ADDRESS_LENGTH: usize = 32;

/// Identifier of a transaction output
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OutputId([u8; OUTPUT_ID_LENGTH]);

impl OutputId {
    /// Wraps raw bytes into an `OutputId`
    pub const fn new(bytes: [u8; OUTPUT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Underlying byte representation
    pub const fn to_bytes(&self) -> &[u8; OUTPUT_ID_LENGTH] {
        &self.0
    }
}

impl TryFrom<&[u8]> for OutputId {
    type Error = ModelsError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; OUTPUT_ID_LENGTH] =
            value.try_into().map_err(|_| ModelsError::InvalidIdLength {
                got: value.len(),
                expected: OUTPUT_ID_LENGTH,
            })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Serializer for `OutputId`
#[derive(Clone, Default)]
pub struct OutputIdSerializer;

impl OutputIdSerializer {
    /// Creates a new `OutputIdSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<OutputId> for OutputIdSerializer {
    fn serialize(&self, value: &OutputId, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `OutputId`
#[derive(Clone, Default)]
pub struct OutputIdDeserializer;

impl OutputIdDeserializer {
    /// Creates a new `OutputIdDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<OutputId> for OutputIdDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], OutputId, E> {
        context("Failed OutputId deserialization", |input: &'a [u8]| {
            let (rest, bytes) = take(OUTPUT_ID_LENGTH)(input)?;
            // take() guarantees the exact length
            Ok((rest, OutputId::new(bytes.try_into().unwrap())))
        })(buffer)
    }
}

/// Address owning an output
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wraps raw bytes into an `Address`
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Underlying byte representation
    pub const fn to_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = ModelsError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; ADDRESS_LENGTH] =
            value.try_into().map_err(|_| ModelsError::InvalidIdLength {
                got: value.len(),
                expected: ADDRESS_LENGTH,
            })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Serializer for `Address`
#[derive(Clone, Default)]
pub struct AddressSerializer;

impl AddressSerializer {
    /// Creates a new `AddressSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Address> for AddressSerializer {
    fn serialize(&self, value: &Address, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `Address`
#[derive(Clone, Default)]
pub struct AddressDeserializer;

impl AddressDeserializer {
    /// Creates a new `AddressDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Address> for AddressDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Address, E> {
        context("Failed Address deserialization", |input: &'a [u8]| {
            let (rest, bytes) = take(ADDRESS_LENGTH)(input)?;
            // take() guarantees the exact length
            Ok((rest, Address::new(bytes.try_into().unwrap())))
        })(buffer)
    }
}

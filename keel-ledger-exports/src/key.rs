// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Key-prefix scheme of the ledger namespace.
//!
//! Every key starts with a one-byte namespace prefix; sub-kinds add a
//! fixed-position discriminator byte right after, so a shorter prefix
//! iterates the union and a longer one iterates the subset.

use keel_models::{MilestoneId, MilestoneIdDeserializer, MilestoneIdSerializer, OutputId};
use keel_serialization::{Deserializer, SerializeError, Serializer};
use nom::bytes::complete::tag;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;

/// Namespace prefix of the ledger milestone index singleton
pub const LEDGER_INDEX_PREFIX: u8 = 0;
/// Namespace prefix of output records
pub const OUTPUT_PREFIX: u8 = 1;
/// Namespace prefix of unspent-output markers
pub const OUTPUT_UNSPENT_PREFIX: u8 = 2;
/// Namespace prefix of spent-output records
pub const OUTPUT_SPENT_PREFIX: u8 = 3;
/// Namespace prefix of treasury outputs
pub const TREASURY_OUTPUT_PREFIX: u8 = 4;

/// Discriminator byte of an unspent treasury output key
pub const TREASURY_UNSPENT_IDENT: u8 = 0;
/// Discriminator byte of a spent treasury output key
pub const TREASURY_SPENT_IDENT: u8 = 1;

/// Key of the persisted ledger milestone index
pub const fn ledger_index_key() -> [u8; 1] {
    [LEDGER_INDEX_PREFIX]
}

/// Key of the output record for `output_id`
pub fn output_key(output_id: &OutputId) -> Vec<u8> {
    [&[OUTPUT_PREFIX], &output_id.to_bytes()[..]].concat()
}

/// Key of the unspent marker for `output_id`
pub fn unspent_output_key(output_id: &OutputId) -> Vec<u8> {
    [&[OUTPUT_UNSPENT_PREFIX], &output_id.to_bytes()[..]].concat()
}

/// Key of the spent record for `output_id`
pub fn spent_output_key(output_id: &OutputId) -> Vec<u8> {
    [&[OUTPUT_SPENT_PREFIX], &output_id.to_bytes()[..]].concat()
}

/// Prefix addressing all treasury outputs, spent and unspent
pub const fn treasury_prefix() -> [u8; 1] {
    [TREASURY_OUTPUT_PREFIX]
}

/// Prefix addressing the unspent treasury partition
pub const fn unspent_treasury_prefix() -> [u8; 2] {
    [TREASURY_OUTPUT_PREFIX, TREASURY_UNSPENT_IDENT]
}

/// Prefix addressing the spent treasury partition
pub const fn spent_treasury_prefix() -> [u8; 2] {
    [TREASURY_OUTPUT_PREFIX, TREASURY_SPENT_IDENT]
}

/// Key of a treasury output.
///
/// The spend flag is part of the key, not the value, so the spent and
/// unspent partitions are separately prefix-iterable and a spend
/// transition is a delete of one key plus an insert of the other, never
/// an in-place update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreasuryKey {
    /// key of an unspent treasury output
    Unspent(MilestoneId),
    /// key of a spent treasury output
    Spent(MilestoneId),
}

impl TreasuryKey {
    /// Milestone id carried by the key
    pub const fn milestone_id(&self) -> &MilestoneId {
        match self {
            TreasuryKey::Unspent(id) | TreasuryKey::Spent(id) => id,
        }
    }

    /// Whether this is a spent-partition key
    pub const fn is_spent(&self) -> bool {
        matches!(self, TreasuryKey::Spent(_))
    }
}

/// Serializer for `TreasuryKey`
#[derive(Clone, Default)]
pub struct TreasuryKeySerializer {
    id_serializer: MilestoneIdSerializer,
}

impl TreasuryKeySerializer {
    /// Creates a new `TreasuryKeySerializer`
    pub const fn new() -> Self {
        Self {
            id_serializer: MilestoneIdSerializer::new(),
        }
    }
}

impl Serializer<TreasuryKey> for TreasuryKeySerializer {
    fn serialize(&self, value: &TreasuryKey, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(TREASURY_OUTPUT_PREFIX);
        buffer.push(match value {
            TreasuryKey::Unspent(_) => TREASURY_UNSPENT_IDENT,
            TreasuryKey::Spent(_) => TREASURY_SPENT_IDENT,
        });
        self.id_serializer.serialize(value.milestone_id(), buffer)
    }
}

/// Deserializer for `TreasuryKey`
#[derive(Clone, Default)]
pub struct TreasuryKeyDeserializer {
    id_deserializer: MilestoneIdDeserializer,
}

impl TreasuryKeyDeserializer {
    /// Creates a new `TreasuryKeyDeserializer`
    pub const fn new() -> Self {
        Self {
            id_deserializer: MilestoneIdDeserializer::new(),
        }
    }
}

impl Deserializer<TreasuryKey> for TreasuryKeyDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], TreasuryKey, E> {
        context("Failed TreasuryKey deserialization", |input: &'a [u8]| {
            let (rest, _) = tag([TREASURY_OUTPUT_PREFIX].as_slice())(input)?;
            let (rest, ident) = match rest.first().copied() {
                Some(ident @ (TREASURY_UNSPENT_IDENT | TREASURY_SPENT_IDENT)) => {
                    (&rest[1..], ident)
                }
                _ => {
                    return Err(nom::Err::Error(E::from_error_kind(
                        input,
                        ErrorKind::IsNot,
                    )))
                }
            };
            let (rest, milestone_id) = self.id_deserializer.deserialize(rest)?;
            let key = if ident == TREASURY_SPENT_IDENT {
                TreasuryKey::Spent(milestone_id)
            } else {
                TreasuryKey::Unspent(milestone_id)
            };
            Ok((rest, key))
        })(buffer)
    }
}

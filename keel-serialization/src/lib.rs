// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Binary serialization primitives shared by every on-disk format of the
//! node. Deserializers are nom parsers so that composite formats can be
//! assembled from the primitives with full error context.
//!
//! All integers are stored fixed-width big-endian so that serialized keys
//! keep their natural ordering under lexicographic comparison.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

use displaydoc::Display;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::number::complete::{be_u32, be_u64};
use nom::IResult;
use std::fmt;
use thiserror::Error;

/// Error while serializing a value into bytes
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SerializeError {
    /// number {0} is too big to be serialized
    NumberTooBig(String),
    /// general error {0}
    GeneralError(String),
}

/// Trait for types able to turn a `T` into bytes, appended to `buffer`.
pub trait Serializer<T> {
    /// Serialize `value` into `buffer`.
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Trait for types able to parse a `T` back out of a byte buffer.
///
/// Returns the unconsumed rest of the buffer along with the parsed value,
/// following the nom convention.
pub trait Deserializer<T> {
    /// Deserialize a `T` from the start of `buffer`.
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Nom error type collecting the context labels attached by deserializers,
/// used where a parse failure must be rendered for an operator or wrapped
/// into a crate error.
#[derive(Clone)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], ErrorKind)>,
    contexts: Vec<&'static str>,
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, kind)],
            contexts: Vec::new(),
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, kind));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(_input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.contexts.push(ctx);
        other
    }
}

impl<'a> fmt::Display for DeserializeError<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // outermost context label first
        for ctx in self.contexts.iter().rev() {
            write!(f, "{} / ", ctx)?;
        }
        match self.errors.first() {
            Some((input, kind)) => write!(
                f,
                "parse error {:?} at {} bytes from the end",
                kind,
                input.len()
            ),
            None => write!(f, "unknown parse error"),
        }
    }
}

impl<'a> fmt::Debug for DeserializeError<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Serializer for `u64`, fixed 8-byte big-endian
#[derive(Clone, Default)]
pub struct U64BESerializer;

impl U64BESerializer {
    /// Creates a new `U64BESerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u64> for U64BESerializer {
    fn serialize(&self, value: &u64, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

/// Deserializer for `u64`, fixed 8-byte big-endian
#[derive(Clone, Default)]
pub struct U64BEDeserializer;

impl U64BEDeserializer {
    /// Creates a new `U64BEDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<u64> for U64BEDeserializer {
    /// ```
    /// use keel_serialization::{Serializer, Deserializer, DeserializeError, U64BESerializer, U64BEDeserializer};
    ///
    /// let mut buffer = Vec::new();
    /// U64BESerializer::new().serialize(&42u64, &mut buffer).unwrap();
    /// let (rest, value) = U64BEDeserializer::new().deserialize::<DeserializeError>(&buffer).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(value, 42);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u64, E> {
        context("Failed u64 deserialization", be_u64)(buffer)
    }
}

/// Serializer for `u32`, fixed 4-byte big-endian
#[derive(Clone, Default)]
pub struct U32BESerializer;

impl U32BESerializer {
    /// Creates a new `U32BESerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u32> for U32BESerializer {
    fn serialize(&self, value: &u32, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

/// Deserializer for `u32`, fixed 4-byte big-endian
#[derive(Clone, Default)]
pub struct U32BEDeserializer;

impl U32BEDeserializer {
    /// Creates a new `U32BEDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<u32> for U32BEDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u32, E> {
        context("Failed u32 deserialization", be_u32)(buffer)
    }
}

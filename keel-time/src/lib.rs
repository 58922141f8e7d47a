// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Unsigned time management
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
pub use error::TimeError;

use keel_serialization::{
    Deserializer, SerializeError, Serializer, U64BEDeserializer, U64BESerializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time structure used everywhere.
/// Milliseconds since 01/01/1970.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeelTime(u64);

impl KeelTime {
    /// Smallest time interval
    pub const EPSILON: KeelTime = KeelTime(1);

    /// Conversion from `u64`, representing a timestamp in milliseconds.
    /// ```
    /// # use keel_time::*;
    /// let time: KeelTime = KeelTime::from_millis(42);
    /// ```
    pub const fn from_millis(value: u64) -> Self {
        KeelTime(value)
    }

    /// Gets the current UNIX timestamp (resolution: milliseconds).
    pub fn now() -> Result<Self, TimeError> {
        let now: u64 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeError::TimeOverflowError)?
            .as_millis()
            .try_into()
            .map_err(|_| TimeError::TimeOverflowError)?;
        Ok(KeelTime(now))
    }

    /// Conversion to `u64`, representing the timestamp in milliseconds.
    /// ```
    /// # use keel_time::*;
    /// let time: KeelTime = KeelTime::from_millis(42);
    /// assert_eq!(time.to_millis(), 42);
    /// ```
    pub const fn to_millis(&self) -> u64 {
        self.0
    }

    /// Conversion to `std::time::Duration` since the UNIX epoch.
    pub const fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// ```
    /// # use keel_time::*;
    /// let time_1: KeelTime = KeelTime::from_millis(42);
    /// let time_2: KeelTime = KeelTime::from_millis(7);
    /// assert_eq!(time_1.saturating_sub(time_2), KeelTime::from_millis(35));
    /// assert_eq!(time_2.saturating_sub(time_1), KeelTime::from_millis(0));
    /// ```
    #[must_use]
    pub fn saturating_sub(self, t: KeelTime) -> Self {
        KeelTime(self.0.saturating_sub(t.0))
    }

    /// ```
    /// # use keel_time::*;
    /// let time_1: KeelTime = KeelTime::from_millis(42);
    /// let time_2: KeelTime = KeelTime::from_millis(7);
    /// assert_eq!(time_1.saturating_add(time_2), KeelTime::from_millis(49));
    /// ```
    #[must_use]
    pub fn saturating_add(self, t: KeelTime) -> Self {
        KeelTime(self.0.saturating_add(t.0))
    }

    /// Subtraction that fails on underflow.
    pub fn checked_sub(self, t: KeelTime) -> Result<Self, TimeError> {
        self.0
            .checked_sub(t.0)
            .ok_or(TimeError::TimeOverflowError)
            .map(KeelTime)
    }

    /// Addition that fails on overflow.
    pub fn checked_add(self, t: KeelTime) -> Result<Self, TimeError> {
        self.0
            .checked_add(t.0)
            .ok_or(TimeError::TimeOverflowError)
            .map(KeelTime)
    }
}

impl fmt::Display for KeelTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis())
    }
}

impl TryFrom<Duration> for KeelTime {
    type Error = TimeError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Ok(KeelTime(
            value
                .as_millis()
                .try_into()
                .map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl From<KeelTime> for Duration {
    fn from(value: KeelTime) -> Self {
        value.to_duration()
    }
}

impl FromStr for KeelTime {
    type Err = TimeError;

    /// ```
    /// # use keel_time::*;
    /// # use std::str::FromStr;
    /// assert_eq!(KeelTime::from_str("42").unwrap(), KeelTime::from_millis(42));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(KeelTime(
            u64::from_str(s).map_err(|_| Self::Err::ConversionError)?,
        ))
    }
}

/// Serializer for `KeelTime`
#[derive(Clone, Default)]
pub struct KeelTimeSerializer {
    u64_serializer: U64BESerializer,
}

impl KeelTimeSerializer {
    /// Creates a `KeelTimeSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64BESerializer::new(),
        }
    }
}

impl Serializer<KeelTime> for KeelTimeSerializer {
    fn serialize(&self, value: &KeelTime, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.to_millis(), buffer)
    }
}

/// Deserializer for `KeelTime`
#[derive(Clone)]
pub struct KeelTimeDeserializer {
    u64_deserializer: U64BEDeserializer,
    range: (Bound<KeelTime>, Bound<KeelTime>),
}

impl KeelTimeDeserializer {
    /// Creates a `KeelTimeDeserializer`
    ///
    /// Arguments:
    /// * range: accepted bounds for the deserialized time
    pub const fn new(range: (Bound<KeelTime>, Bound<KeelTime>)) -> Self {
        Self {
            u64_deserializer: U64BEDeserializer::new(),
            range,
        }
    }

    fn in_range(&self, time: KeelTime) -> bool {
        let lower_ok = match self.range.0 {
            Bound::Included(min) => time >= min,
            Bound::Excluded(min) => time > min,
            Bound::Unbounded => true,
        };
        let upper_ok = match self.range.1 {
            Bound::Included(max) => time <= max,
            Bound::Excluded(max) => time < max,
            Bound::Unbounded => true,
        };
        lower_ok && upper_ok
    }
}

impl Deserializer<KeelTime> for KeelTimeDeserializer {
    /// ```
    /// use std::ops::Bound::Unbounded;
    /// use keel_serialization::{Serializer, Deserializer, DeserializeError};
    /// use keel_time::{KeelTime, KeelTimeSerializer, KeelTimeDeserializer};
    ///
    /// let time: KeelTime = KeelTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// KeelTimeSerializer::new().serialize(&time, &mut serialized).unwrap();
    /// let deserializer = KeelTimeDeserializer::new((Unbounded, Unbounded));
    /// let (rest, time_deser) = deserializer.deserialize::<DeserializeError>(&serialized).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(time, time_deser);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], KeelTime, E> {
        context("Failed KeelTime deserialization", |input: &'a [u8]| {
            let (rest, millis) = self.u64_deserializer.deserialize(input)?;
            let time = KeelTime::from_millis(millis);
            if !self.in_range(time) {
                return Err(nom::Err::Error(E::from_error_kind(
                    input,
                    nom::error::ErrorKind::Verify,
                )));
            }
            Ok((rest, time))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_serialization::DeserializeError;
    use std::ops::Bound::{Included, Unbounded};

    #[test]
    fn test_now_is_monotonic_enough() {
        let a = KeelTime::now().unwrap();
        let b = KeelTime::now().unwrap();
        assert!(b >= a);
    }

    #[test]
    fn test_checked_arithmetic() {
        let t = KeelTime::from_millis(10);
        assert_eq!(
            t.checked_add(KeelTime::from_millis(5)).unwrap(),
            KeelTime::from_millis(15)
        );
        assert_eq!(
            t.checked_sub(KeelTime::from_millis(20)),
            Err(TimeError::TimeOverflowError)
        );
    }

    #[test]
    fn test_deserializer_range_check() {
        let mut serialized = Vec::new();
        KeelTimeSerializer::new()
            .serialize(&KeelTime::from_millis(5), &mut serialized)
            .unwrap();
        let deserializer =
            KeelTimeDeserializer::new((Included(KeelTime::from_millis(10)), Unbounded));
        assert!(deserializer
            .deserialize::<DeserializeError>(&serialized)
            .is_err());
    }
}

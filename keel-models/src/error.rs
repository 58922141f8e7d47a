// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use displaydoc::Display;
use keel_serialization::SerializeError;
use thiserror::Error;

/// Models error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum ModelsError {
    /// invalid identifier length: got {got}, expected {expected}
    InvalidIdLength {
        /// length of the rejected input
        got: usize,
        /// required fixed length
        expected: usize,
    },
    /// serialization error: {0}
    SerializeError(#[from] SerializeError),
    /// deserialization error: {0}
    DeserializeError(String),
}

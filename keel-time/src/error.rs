// Copyright (c) 2024 KEEL LABS <info@keel.dev>

use displaydoc::Display;
use thiserror::Error;

/// Time error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    /// time overflow error
    TimeOverflowError,
    /// time conversion error
    ConversionError,
}

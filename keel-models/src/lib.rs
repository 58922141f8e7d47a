// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Domain model types shared across the node: fixed-length identifiers,
//! milestone bookkeeping records and their binary serializers.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
/// Milestone identifiers and records
pub mod milestone;
/// Transaction output identifiers and addresses
pub mod output;

pub use error::ModelsError;
pub use milestone::{
    MilestoneId, MilestoneIdDeserializer, MilestoneIdSerializer, MilestoneIndex,
    MilestoneIndexDeserializer, MilestoneIndexSerializer, MilestoneRecord, MILESTONE_ID_LENGTH,
};
pub use output::{
    Address, AddressDeserializer, AddressSerializer, OutputId, OutputIdDeserializer,
    OutputIdSerializer, ADDRESS_LENGTH, OUTPUT_ID_LENGTH,
};

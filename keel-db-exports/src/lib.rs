// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Contract of the durable key-value store backing the ledger: the
//! `StoreController` trait, the atomic write batch, the backend selection
//! settings and the store error taxonomy. Backend implementations live in
//! `keel-db-worker`; everything above the store is written against this
//! crate only.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod constants;
mod controller;
mod db_batch;
mod error;
mod settings;

pub use constants::*;
pub use controller::*;
pub use db_batch::*;
pub use error::*;
pub use settings::*;

// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Node-level services around the ledger store: database lifecycle
//! (open, schema versioning, garbage collection, clean shutdown), the
//! node health predicate and the related configuration.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod database;
mod error;
mod health;
mod settings;

pub use database::{Database, DatabaseCleanup, DB_SCHEMA_VERSION};
pub use error::NodeError;
pub use health::{
    HealthMonitor, MilestoneView, PeerManagerView, PeerRelation, SyncStatusView,
    MAX_ALLOWED_MILESTONE_AGE,
};
pub use settings::DatabaseSettings;

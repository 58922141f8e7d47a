// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Database lifecycle: open, schema versioning, garbage collection and
//! clean shutdown, on top of the `StoreController` backends.

use crate::{DatabaseSettings, NodeError};
use crossbeam_channel::Sender;
use keel_db_exports::{StoreController, StoreError, DIRTY_MARKER_KEY, SCHEMA_VERSION_KEY};
use keel_db_worker::open_store;
use keel_time::KeelTime;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Schema version written by this node. Bump on any change to the key
/// namespace or value encodings; there is no migration path, a mismatch
/// requires a resynchronization.
pub const DB_SCHEMA_VERSION: u64 = 1;

/// Event emitted around a garbage-collection run: once with `end: None`
/// when the run starts, once more with the completion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseCleanup {
    /// when the run started
    pub start: KeelTime,
    /// when the run finished, `None` while still running
    pub end: Option<KeelTime>,
}

/// Lifecycle controller of the node database
pub struct Database {
    store: Arc<dyn StoreController>,
    gc_lock: Mutex<()>,
    cleanup_events: Option<Sender<DatabaseCleanup>>,
    unclean_shutdown: bool,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("store", &self.store)
            .field("unclean_shutdown", &self.unclean_shutdown)
            .finish()
    }
}

impl Database {
    /// Opens the configured backend, verifies the schema version and sets
    /// the dirty marker that `close` removes again.
    pub fn open(
        settings: &DatabaseSettings,
        cleanup_events: Option<Sender<DatabaseCleanup>>,
    ) -> Result<Self, NodeError> {
        let store = open_store(&settings.store_config()?)?;
        let mut database = Self {
            store,
            gc_lock: Mutex::new(()),
            cleanup_events,
            unclean_shutdown: false,
        };
        database.check_schema_version()?;
        database.unclean_shutdown = database.store.get(DIRTY_MARKER_KEY)?.is_some();
        if database.unclean_shutdown {
            warn!("database was not shut down cleanly in the previous run");
        }
        database.store.set(DIRTY_MARKER_KEY, &[])?;
        info!("database opened with {} engine", database.store.engine());
        Ok(database)
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<dyn StoreController> {
        Arc::clone(&self.store)
    }

    /// Whether the previous run left the dirty marker behind
    pub const fn unclean_shutdown(&self) -> bool {
        self.unclean_shutdown
    }

    /// Compares the persisted schema version with `DB_SCHEMA_VERSION`.
    /// Fresh stores are stamped; a mismatch is fatal because no migration
    /// path is registered.
    pub fn check_schema_version(&self) -> Result<(), NodeError> {
        match self.store.get(SCHEMA_VERSION_KEY)? {
            None => {
                self.store
                    .set(SCHEMA_VERSION_KEY, &DB_SCHEMA_VERSION.to_be_bytes())?;
                info!("database stamped with schema version {}", DB_SCHEMA_VERSION);
                Ok(())
            }
            Some(raw) => {
                let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
                    NodeError::CorruptMetadata(format!(
                        "schema version record has width {}, expected 8",
                        raw.len()
                    ))
                })?;
                let found = u64::from_be_bytes(bytes);
                if found == DB_SCHEMA_VERSION {
                    return Ok(());
                }
                Err(NodeError::SchemaVersionMismatch {
                    found,
                    expected: DB_SCHEMA_VERSION,
                })
            }
        }
    }

    /// Runs backend cleanup, serialized per instance. Backends without a
    /// cleanup operation return immediately and emit no events. Cleanup
    /// failures are logged, never fatal.
    pub fn run_garbage_collection(&self) {
        if !self.store.supports_cleanup() {
            return;
        }
        let _guard = self.gc_lock.lock();
        let start = KeelTime::now().expect("could not get current time");
        self.emit_cleanup(DatabaseCleanup { start, end: None });
        match self.store.cleanup() {
            Ok(()) => {}
            Err(StoreError::NothingToCleanUp) => {
                info!("database garbage collection: nothing to clean up")
            }
            Err(e) => warn!("database garbage collection failed: {}", e),
        }
        let end = KeelTime::now().expect("could not get current time");
        self.emit_cleanup(DatabaseCleanup {
            start,
            end: Some(end),
        });
    }

    /// Clean shutdown: removes the dirty marker, then flushes, then
    /// closes the backend. The marker removal always runs first so a
    /// crash during flush still counts as unclean.
    pub fn close(&self) -> Result<(), NodeError> {
        let marked = self.store.delete(DIRTY_MARKER_KEY);
        let flushed = self.store.flush();
        let closed = self.store.close();
        marked?;
        flushed?;
        closed?;
        info!("database closed cleanly");
        Ok(())
    }

    fn emit_cleanup(&self, event: DatabaseCleanup) {
        if let Some(sender) = &self.cleanup_events {
            // the receiver may already be gone during shutdown
            let _ = sender.send(event);
        }
    }
}

// Copyright (c) 2024 KEEL LABS <info@keel.dev>

/// Namespace prefix reserved for store metadata, kept out of the way of
/// the ledger partitions which grow upward from zero.
pub const METADATA_PREFIX: u8 = u8::MAX;

/// Key holding the on-disk schema version (value: u64 big-endian)
pub const SCHEMA_VERSION_KEY: &[u8; 2] = &[METADATA_PREFIX, 0];

/// Key marking the store as in-use; present while the process runs,
/// removed by a clean shutdown
pub const DIRTY_MARKER_KEY: &[u8; 2] = &[METADATA_PREFIX, 1];

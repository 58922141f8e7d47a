// Copyright (c) 2024 KEEL LABS <info@keel.dev>

/// Options steering ledger iteration.
///
/// By default iteration holds the ledger read lock for its whole
/// lifetime and is unbounded. Callers that tolerate concurrent writes
/// (snapshotting engines, diagnostics) can opt out of the lock, and
/// bounded consumers can cap the result count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterateOptions {
    /// hold the ledger read lock while the iterator is alive
    pub read_lock_ledger: bool,
    /// stop after this many results, `None` for unbounded
    pub max_result_count: Option<usize>,
}

impl Default for IterateOptions {
    fn default() -> Self {
        Self {
            read_lock_ledger: true,
            max_result_count: None,
        }
    }
}

impl IterateOptions {
    /// Creates the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the ledger read lock is held during iteration
    #[must_use]
    pub fn with_read_lock(mut self, read_lock_ledger: bool) -> Self {
        self.read_lock_ledger = read_lock_ledger;
        self
    }

    /// Caps the number of yielded results
    #[must_use]
    pub fn with_max_result_count(mut self, max_result_count: usize) -> Self {
        self.max_result_count = Some(max_result_count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = IterateOptions::default();
        assert!(options.read_lock_ledger);
        assert_eq!(options.max_result_count, None);
    }

    #[test]
    fn test_builders() {
        let options = IterateOptions::new()
            .with_read_lock(false)
            .with_max_result_count(10);
        assert!(!options.read_lock_ledger);
        assert_eq!(options.max_result_count, Some(10));
    }
}

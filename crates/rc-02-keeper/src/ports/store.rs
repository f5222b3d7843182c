//! # Key-value store port
//!
//! The host runtime provides the real store with atomic block commit;
//! the keeper only requires these primitives. Prefix scans MUST return
//! keys in lexicographic byte order — iteration order is consensus.

use crate::errors::KeeperError;

/// Minimal ordered key-value storage.
pub trait KvStore {
    /// Fetch a value.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeeperError>;

    /// Store a value, overwriting any previous one.
    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<(), KeeperError>;

    /// Remove a value. Removing a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), KeeperError>;

    /// Whether a key exists.
    fn has(&self, key: &str) -> Result<bool, KeeperError>;

    /// All `(key, value)` pairs whose key starts with `prefix`, in
    /// ascending lexicographic key order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KeeperError>;

    /// Open a transaction boundary. Boundaries nest.
    fn begin(&mut self);

    /// Keep every write since the matching [`KvStore::begin`].
    fn commit(&mut self);

    /// Discard every write since the matching [`KvStore::begin`].
    fn rollback(&mut self);
}

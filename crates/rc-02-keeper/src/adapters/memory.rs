//! # In-memory store
//!
//! `BTreeMap`-backed [`KvStore`] with checkpoint/rollback, used for tests
//! and as the per-message atomicity boundary inside block execution. The
//! BTreeMap gives lexicographic prefix scans for free.

use crate::errors::KeeperError;
use crate::ports::KvStore;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Deterministic in-memory key-value store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
    /// Stack of snapshots for open transaction boundaries.
    pending: Vec<BTreeMap<String, Vec<u8>>>,
}

/// A point-in-time copy of the store contents.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current contents. Restoring the checkpoint discards
    /// every write made after it — the per-message rollback boundary.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            entries: self.entries.clone(),
        }
    }

    /// Discard all writes since the checkpoint.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.entries = checkpoint.entries;
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeeperError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<(), KeeperError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), KeeperError> {
        self.entries.remove(key);
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, KeeperError> {
        Ok(self.entries.contains_key(key))
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KeeperError> {
        let range = self
            .entries
            .range::<String, _>((Bound::Included(prefix.to_string()), Bound::Unbounded));
        let mut out = Vec::new();
        for (key, value) in range {
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.clone(), value.clone()));
        }
        Ok(out)
    }

    fn begin(&mut self) {
        self.pending.push(self.entries.clone());
    }

    fn commit(&mut self) {
        self.pending.pop();
    }

    fn rollback(&mut self) {
        if let Some(snapshot) = self.pending.pop() {
            self.entries = snapshot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_delete() {
        let mut store = MemoryStore::new();
        store.set("pool/BNB.BNB", vec![1, 2, 3]).unwrap();
        assert_eq!(store.get("pool/BNB.BNB").unwrap(), Some(vec![1, 2, 3]));
        assert!(store.has("pool/BNB.BNB").unwrap());
        store.delete("pool/BNB.BNB").unwrap();
        assert_eq!(store.get("pool/BNB.BNB").unwrap(), None);
        // deleting again is fine
        store.delete("pool/BNB.BNB").unwrap();
    }

    #[test]
    fn test_scan_prefix_is_ordered() {
        let mut store = MemoryStore::new();
        store.set("pool/BTC.BTC", vec![2]).unwrap();
        store.set("pool/BNB.BNB", vec![1]).unwrap();
        store.set("staker/BNB.BNB/addr", vec![9]).unwrap();

        let pools = store.scan_prefix("pool/").unwrap();
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].0, "pool/BNB.BNB");
        assert_eq!(pools[1].0, "pool/BTC.BTC");
    }

    #[test]
    fn test_scan_prefix_excludes_neighbours() {
        let mut store = MemoryStore::new();
        store.set("pool/A", vec![1]).unwrap();
        store.set("pool0", vec![2]).unwrap();
        store.set("pook/Z", vec![3]).unwrap();
        let scanned = store.scan_prefix("pool/").unwrap();
        assert_eq!(scanned.len(), 1);
    }

    #[test]
    fn test_transaction_boundaries() {
        let mut store = MemoryStore::new();
        store.set("kept", vec![1]).unwrap();
        store.begin();
        store.set("discarded", vec![2]).unwrap();
        store.rollback();
        assert!(!store.has("discarded").unwrap());

        store.begin();
        store.set("committed", vec![3]).unwrap();
        store.commit();
        assert!(store.has("committed").unwrap());
        assert!(store.has("kept").unwrap());
    }

    #[test]
    fn test_checkpoint_rollback() {
        let mut store = MemoryStore::new();
        store.set("a", vec![1]).unwrap();
        let checkpoint = store.checkpoint();
        store.set("a", vec![2]).unwrap();
        store.set("b", vec![3]).unwrap();
        store.restore(checkpoint);
        assert_eq!(store.get("a").unwrap(), Some(vec![1]));
        assert_eq!(store.get("b").unwrap(), None);
    }
}

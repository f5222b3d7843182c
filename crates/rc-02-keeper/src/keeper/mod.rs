//! # Keeper
//!
//! Typed accessors over the key-value store, one module per key prefix.
//! Values are bincode-encoded except events, which are stored as JSON so
//! off-chain indexers can read them byte-for-byte.

pub mod ban;
pub mod chains;
pub mod events;
pub mod gas;
pub mod keygen;
pub mod last_heights;
pub mod liquidity_fees;
pub mod mimir;
pub mod node_accounts;
pub mod observer;
pub mod pools;
pub mod stakers;
pub mod swap_queue;
pub mod tss;
pub mod tx_markers;
pub mod txout;
pub mod vault_data;
pub mod vaults;

pub use ban::BanVoter;
pub use keygen::Keygen;
pub use tss::TssVoter;
pub use tx_markers::TxMarker;

use crate::errors::KeeperError;
use crate::ports::KvStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key prefixes. Numeric segments are zero-padded so lexicographic order
/// equals numeric order.
pub mod keys {
    /// Pool records.
    pub const POOL: &str = "pool/";
    /// Staker records, `staker/<asset>/<rune_address>`.
    pub const STAKER: &str = "staker/";
    /// Vault records.
    pub const VAULT: &str = "vault/";
    /// Index of asgard vault pubkeys.
    pub const VAULT_ASGARD_INDEX: &str = "vault-asgard-index";
    /// Observed-tx voters.
    pub const OBSERVED_TX: &str = "observed-tx/";
    /// Errata voters, `errata-tx/<tx_id>/<chain>`.
    pub const ERRATA_TX: &str = "errata-tx/";
    /// Node accounts.
    pub const NODE: &str = "node/";
    /// Outbound batches per height.
    pub const TXOUT: &str = "txout/";
    /// Completed events by id.
    pub const EVENT: &str = "event/";
    /// The last assigned event id.
    pub const LAST_EVENT_ID: &str = "last-event-id";
    /// Events awaiting outbound completion.
    pub const INCOMPLETE_EVENTS: &str = "incomplete-events";
    /// The global reward/reserve accumulator.
    pub const VAULT_DATA: &str = "vault-data";
    /// Reserve contributor records.
    pub const RESERVE_CONTRIBUTORS: &str = "reserve-contributors";
    /// Operator overrides.
    pub const MIMIR: &str = "mimir/";
    /// Last observed gas price per asset.
    pub const GAS: &str = "gas/";
    /// Total liquidity fees per block.
    pub const LIQUIDITY_FEE_HEIGHT: &str = "liquidity-fee/height/";
    /// Per-pool liquidity fees per block.
    pub const LIQUIDITY_FEE_POOL: &str = "liquidity-fee/pool/";
    /// Addresses that observed something this block.
    pub const OBSERVING_ADDRESSES: &str = "observing-addresses";
    /// Registered observer flags.
    pub const ACTIVE_OBSERVER: &str = "active-observer/";
    /// The set of chains with registered activity.
    pub const CHAINS: &str = "chains";
    /// Ragnarok progress marker.
    pub const RAGNAROK: &str = "ragnarok";
    /// Native height of the last signed outbound batch.
    pub const LAST_SIGNED_HEIGHT: &str = "last-signed-height";
    /// Last witnessed height per foreign chain.
    pub const LAST_CHAIN_HEIGHT: &str = "last-chain-height/";
    /// Pending swaps.
    pub const SWAP_QUEUE: &str = "swap-queue/";
    /// Markers correlating internally initiated outbounds.
    pub const TX_MARKER: &str = "tx-marker/";
    /// Node-ban voters.
    pub const BAN_VOTER: &str = "ban-voter/";
    /// TSS keygen voters.
    pub const TSS_VOTER: &str = "tss-voter/";
    /// Keygen requests per height.
    pub const KEYGENS: &str = "keygens/";
    /// Per-chain outbound sequence counters.
    pub const SEQ_NO: &str = "seq-no/";
}

/// Zero-pad a numeric key segment to 12 digits.
pub fn pad_height(height: u64) -> String {
    format!("{height:012}")
}

/// The typed state accessor shared by every subsystem.
pub struct Keeper {
    store: Box<dyn KvStore>,
}

impl Keeper {
    /// Wrap a store.
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Open a transaction boundary; pair with [`Keeper::commit_tx`] or
    /// [`Keeper::rollback_tx`]. One message is one boundary.
    pub fn begin_tx(&mut self) {
        self.store.begin();
    }

    /// Keep every write since the matching [`Keeper::begin_tx`].
    pub fn commit_tx(&mut self) {
        self.store.commit();
    }

    /// Discard every write since the matching [`Keeper::begin_tx`].
    pub fn rollback_tx(&mut self) {
        self.store.rollback();
    }

    pub(crate) fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), KeeperError> {
        let bytes = bincode::serialize(value).map_err(|e| KeeperError::Codec {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(key, bytes)
    }

    pub(crate) fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, KeeperError> {
        match self.store.get(key)? {
            None => Ok(None),
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| KeeperError::Codec {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub(crate) fn put_json<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), KeeperError> {
        let bytes = serde_json::to_vec(value).map_err(|e| KeeperError::Codec {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(key, bytes)
    }

    pub(crate) fn fetch_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, KeeperError> {
        match self.store.get(key)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| KeeperError::Codec {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub(crate) fn remove(&mut self, key: &str) -> Result<(), KeeperError> {
        self.store.delete(key)
    }

    pub(crate) fn exists(&self, key: &str) -> Result<bool, KeeperError> {
        self.store.has(key)
    }

    pub(crate) fn scan_raw(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, KeeperError> {
        self.store.scan_prefix(prefix)
    }

    pub(crate) fn scan<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> Result<Vec<T>, KeeperError> {
        let mut out = Vec::new();
        for (key, bytes) in self.store.scan_prefix(prefix)? {
            let value = bincode::deserialize(&bytes).map_err(|e| KeeperError::Codec {
                key,
                reason: e.to_string(),
            })?;
            out.push(value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;

    #[test]
    fn test_pad_height_orders_lexicographically() {
        assert!(pad_height(2) < pad_height(10));
        assert!(pad_height(999) < pad_height(1_000));
        assert_eq!(pad_height(42), "000000000042");
    }

    #[test]
    fn test_put_fetch_round_trip() {
        let mut keeper = Keeper::new(Box::new(MemoryStore::new()));
        keeper.put("k", &42u64).unwrap();
        assert_eq!(keeper.fetch::<u64>("k").unwrap(), Some(42));
        assert_eq!(keeper.fetch::<u64>("missing").unwrap(), None);
    }
}

//! # Outbound transactions
//!
//! Items scheduled for signing and broadcast on foreign chains, batched
//! per block.

use crate::chain::Chain;
use crate::coin::{Coin, Gas};
use crate::tx::{Address, PubKey, TxId};
use serde::{Deserialize, Serialize};

/// One scheduled outbound transfer.
///
/// `in_hash` is blank exactly when the item is internally initiated
/// (migrate / ragnarok / yggdrasil funding).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutItem {
    /// Destination chain.
    pub chain: Chain,
    /// Destination address.
    pub to_address: Address,
    /// Vault expected to sign the item.
    pub vault_pub_key: PubKey,
    /// The coin to send.
    pub coin: Coin,
    /// Memo to attach on the foreign chain.
    pub memo: String,
    /// Hash of the inbound tx this item responds to.
    pub in_hash: TxId,
    /// Hash of the broadcast foreign tx, filled on observation.
    pub out_hash: TxId,
    /// Gas allowance for the signer.
    pub max_gas: Gas,
    /// Per-chain, per-block sequence number.
    pub seq_no: u64,
}

impl TxOutItem {
    /// Create an item; memo and gas are filled during preparation.
    pub fn new(chain: Chain, to_address: Address, coin: Coin, in_hash: TxId) -> Self {
        Self {
            chain,
            to_address,
            vault_pub_key: PubKey::default(),
            coin,
            memo: String::new(),
            in_hash,
            out_hash: TxId::default(),
            max_gas: Gas::default(),
            seq_no: 0,
        }
    }

    /// Whether the network originated this item itself.
    pub fn is_internal(&self) -> bool {
        self.in_hash.is_blank()
    }

    /// Deterministic content hash used for marker correlation.
    pub fn tx_hash(&self) -> TxId {
        let summary = format!(
            "{}|{}|{}|{}|{}",
            self.chain, self.to_address, self.vault_pub_key, self.coin, self.in_hash
        );
        TxId::from_hash(summary.as_bytes())
    }
}

/// The outbound batch for one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TxOut {
    /// Block height the batch belongs to.
    pub height: u64,
    /// Scheduled items, in creation order.
    pub tx_array: Vec<TxOutItem>,
}

impl TxOut {
    /// Create an empty batch for the height.
    pub fn new(height: u64) -> Self {
        Self {
            height,
            tx_array: Vec::new(),
        }
    }

    /// Whether nothing was scheduled.
    pub fn is_empty(&self) -> bool {
        self.tx_array.is_empty()
    }
}

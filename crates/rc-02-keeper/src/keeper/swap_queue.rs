//! Swap queue persistence, keyed by the inbound tx id.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::{QueuedSwap, TxId};

impl Keeper {
    fn swap_key(tx_id: &TxId) -> String {
        format!("{}{}", keys::SWAP_QUEUE, tx_id)
    }

    /// Enqueue a swap. Overwrites a re-observed duplicate.
    pub fn set_swap_queue_item(&mut self, swap: &QueuedSwap) -> Result<(), KeeperError> {
        self.put(&Self::swap_key(&swap.tx.id), swap)
    }

    /// Drop a swap from the queue.
    pub fn remove_swap_queue_item(&mut self, tx_id: &TxId) -> Result<(), KeeperError> {
        self.remove(&Self::swap_key(tx_id))
    }

    /// The whole queue, in tx-id order.
    pub fn get_swap_queue(&self) -> Result<Vec<QueuedSwap>, KeeperError> {
        self.scan(keys::SWAP_QUEUE)
    }
}

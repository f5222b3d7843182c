//! Outbound batch persistence and per-chain sequence counters.

use super::{keys, pad_height, Keeper};
use crate::errors::KeeperError;
use shared_types::{Chain, TxOut, TxOutItem};

impl Keeper {
    fn txout_key(height: u64) -> String {
        format!("{}{}", keys::TXOUT, pad_height(height))
    }

    /// Fetch the outbound batch for the height, or an empty one.
    pub fn get_txout(&self, height: u64) -> Result<TxOut, KeeperError> {
        Ok(self
            .fetch(&Self::txout_key(height))?
            .unwrap_or_else(|| TxOut::new(height)))
    }

    /// Persist the outbound batch.
    pub fn set_txout(&mut self, txout: &TxOut) -> Result<(), KeeperError> {
        self.put(&Self::txout_key(txout.height), txout)
    }

    /// Append an item to the batch for the height.
    pub fn append_txout(&mut self, height: u64, item: TxOutItem) -> Result<(), KeeperError> {
        let mut txout = self.get_txout(height)?;
        txout.tx_array.push(item);
        self.set_txout(&txout)
    }

    /// All outbound batches at or after the height, in height order.
    pub fn get_txouts_since(&self, height: u64) -> Result<Vec<TxOut>, KeeperError> {
        Ok(self
            .scan::<TxOut>(keys::TXOUT)?
            .into_iter()
            .filter(|t| t.height >= height)
            .collect())
    }

    /// Allocate the next outbound sequence number for the chain.
    pub fn next_seq_no(&mut self, chain: Chain) -> Result<u64, KeeperError> {
        let key = format!("{}{}", keys::SEQ_NO, chain);
        let current: u64 = self.fetch(&key)?.unwrap_or_default();
        self.put(&key, &(current + 1))?;
        Ok(current)
    }
}

//! Height watermarks: the last signed native height and the last
//! witnessed height per foreign chain.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::Chain;

impl Keeper {
    /// Record the native height of the latest signed outbound batch.
    /// Never moves backwards.
    pub fn set_last_signed_height(&mut self, height: u64) -> Result<(), KeeperError> {
        if height > self.get_last_signed_height()? {
            self.put(keys::LAST_SIGNED_HEIGHT, &height)?;
        }
        Ok(())
    }

    /// The latest signed native height.
    pub fn get_last_signed_height(&self) -> Result<u64, KeeperError> {
        Ok(self.fetch(keys::LAST_SIGNED_HEIGHT)?.unwrap_or_default())
    }

    /// Record the latest witnessed foreign height. Never moves backwards.
    pub fn set_last_chain_height(&mut self, chain: Chain, height: u64) -> Result<(), KeeperError> {
        let key = format!("{}{}", keys::LAST_CHAIN_HEIGHT, chain);
        let current: u64 = self.fetch(&key)?.unwrap_or_default();
        if height > current {
            self.put(&key, &height)?;
        }
        Ok(())
    }

    /// The latest witnessed height for the chain.
    pub fn get_last_chain_height(&self, chain: Chain) -> Result<u64, KeeperError> {
        Ok(self
            .fetch(&format!("{}{}", keys::LAST_CHAIN_HEIGHT, chain))?
            .unwrap_or_default())
    }
}

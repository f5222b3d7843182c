//! Staker persistence, keyed `staker/<asset>/<rune_address>`.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::{Address, Asset, Staker};

impl Keeper {
    fn staker_key(asset: &Asset, addr: &Address) -> String {
        format!("{}{}/{}", keys::STAKER, asset, addr)
    }

    /// Fetch the staker record, or an empty one when absent.
    pub fn get_staker(&self, asset: &Asset, addr: &Address) -> Result<Staker, KeeperError> {
        Ok(self
            .fetch(&Self::staker_key(asset, addr))?
            .unwrap_or_else(|| Staker::new(asset.clone(), addr.clone())))
    }

    /// Persist the staker record.
    pub fn set_staker(&mut self, staker: &Staker) -> Result<(), KeeperError> {
        self.put(&Self::staker_key(&staker.asset, &staker.rune_address), staker)
    }

    /// Delete the staker record.
    pub fn remove_staker(&mut self, staker: &Staker) -> Result<(), KeeperError> {
        self.remove(&Self::staker_key(&staker.asset, &staker.rune_address))
    }

    /// All stakers of a pool, in address key order.
    pub fn get_stakers(&self, asset: &Asset) -> Result<Vec<Staker>, KeeperError> {
        self.scan(&format!("{}{}/", keys::STAKER, asset))
    }
}

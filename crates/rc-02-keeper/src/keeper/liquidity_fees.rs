//! Liquidity fee accounting, per block and per pool, in RUNE.

use super::{keys, pad_height, Keeper};
use crate::errors::KeeperError;
use shared_types::Asset;

impl Keeper {
    fn total_key(height: u64) -> String {
        format!("{}{}", keys::LIQUIDITY_FEE_HEIGHT, pad_height(height))
    }

    fn liquidity_fee_pool_key(height: u64, asset: &Asset) -> String {
        format!("{}{}/{}", keys::LIQUIDITY_FEE_POOL, pad_height(height), asset)
    }

    /// Record a swap's liquidity fee against the block and the pool.
    pub fn add_to_liquidity_fees(
        &mut self,
        height: u64,
        asset: &Asset,
        fee: u128,
    ) -> Result<(), KeeperError> {
        let total = self.get_total_liquidity_fees(height)? + fee;
        self.put(&Self::total_key(height), &total)?;
        let pool_total = self.get_pool_liquidity_fees(height, asset)? + fee;
        self.put(&Self::liquidity_fee_pool_key(height, asset), &pool_total)
    }

    /// Total liquidity fees collected in the block.
    pub fn get_total_liquidity_fees(&self, height: u64) -> Result<u128, KeeperError> {
        Ok(self.fetch(&Self::total_key(height))?.unwrap_or_default())
    }

    /// Liquidity fees collected by one pool in the block.
    pub fn get_pool_liquidity_fees(
        &self,
        height: u64,
        asset: &Asset,
    ) -> Result<u128, KeeperError> {
        Ok(self.fetch(&Self::liquidity_fee_pool_key(height, asset))?.unwrap_or_default())
    }
}

//! Last-observed gas price per asset, fed by inbound witnesses and read
//! when sizing outbound gas allowances.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::Asset;

impl Keeper {
    fn gas_key(asset: &Asset) -> String {
        format!("{}{}", keys::GAS, asset)
    }

    /// Record the gas amount one foreign transaction cost.
    pub fn set_gas(&mut self, asset: &Asset, amount: u128) -> Result<(), KeeperError> {
        if amount == 0 {
            return Ok(());
        }
        self.put(&Self::gas_key(asset), &amount)
    }

    /// The last observed per-transaction gas amount for the asset.
    pub fn get_gas(&self, asset: &Asset) -> Result<u128, KeeperError> {
        Ok(self.fetch(&Self::gas_key(asset))?.unwrap_or_default())
    }
}

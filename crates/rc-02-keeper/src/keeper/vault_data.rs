//! The global reward/reserve accumulator and reserve contributors.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::{ReserveContributor, VaultData};

impl Keeper {
    /// Fetch the global accumulator.
    pub fn get_vault_data(&self) -> Result<VaultData, KeeperError> {
        Ok(self.fetch(keys::VAULT_DATA)?.unwrap_or_default())
    }

    /// Persist the global accumulator.
    pub fn set_vault_data(&mut self, data: &VaultData) -> Result<(), KeeperError> {
        self.put(keys::VAULT_DATA, data)
    }

    /// Credit RUNE into the protocol reserve.
    pub fn add_fee_to_reserve(&mut self, amount: u128) -> Result<(), KeeperError> {
        let mut data = self.get_vault_data()?;
        data.total_reserve += amount;
        self.set_vault_data(&data)
    }

    /// All reserve contributors.
    pub fn get_reserve_contributors(&self) -> Result<Vec<ReserveContributor>, KeeperError> {
        Ok(self.fetch(keys::RESERVE_CONTRIBUTORS)?.unwrap_or_default())
    }

    /// Record a reserve contribution, merging by address.
    pub fn add_reserve_contributor(
        &mut self,
        contributor: ReserveContributor,
    ) -> Result<(), KeeperError> {
        let mut contributors = self.get_reserve_contributors()?;
        match contributors
            .iter_mut()
            .find(|c| c.address == contributor.address)
        {
            Some(existing) => existing.amount += contributor.amount,
            None => contributors.push(contributor),
        }
        self.put(keys::RESERVE_CONTRIBUTORS, &contributors)
    }

    /// Mark ragnarok as started at the height. Idempotent.
    pub fn set_ragnarok_height(&mut self, height: u64) -> Result<(), KeeperError> {
        if self.get_ragnarok_height()?.is_none() {
            self.put(keys::RAGNAROK, &height)?;
        }
        Ok(())
    }

    /// The height ragnarok started, if it has.
    pub fn get_ragnarok_height(&self) -> Result<Option<u64>, KeeperError> {
        self.fetch(keys::RAGNAROK)
    }
}

//! The set of chains with registered activity.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::Chain;
use std::collections::BTreeSet;

impl Keeper {
    /// Chains the network currently serves.
    pub fn get_chains(&self) -> Result<BTreeSet<Chain>, KeeperError> {
        Ok(self.fetch(keys::CHAINS)?.unwrap_or_default())
    }

    /// Register a chain.
    pub fn add_chain(&mut self, chain: Chain) -> Result<(), KeeperError> {
        let mut chains = self.get_chains()?;
        if chains.insert(chain) {
            self.put(keys::CHAINS, &chains)?;
        }
        Ok(())
    }

    /// Replace the chain set.
    pub fn set_chains(&mut self, chains: &BTreeSet<Chain>) -> Result<(), KeeperError> {
        self.put(keys::CHAINS, chains)
    }
}

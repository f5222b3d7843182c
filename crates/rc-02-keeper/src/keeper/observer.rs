//! Observation persistence: voters, errata voters, observing addresses,
//! and registered observer flags.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::{Chain, ErrataTxVoter, NodeAddress, ObservedTxVoter, TxId};

impl Keeper {
    fn voter_key(tx_id: &TxId) -> String {
        format!("{}{}", keys::OBSERVED_TX, tx_id)
    }

    fn errata_key(tx_id: &TxId, chain: Chain) -> String {
        format!("{}{}/{}", keys::ERRATA_TX, tx_id, chain)
    }

    /// Fetch the voter for the tx id, creating an empty one when absent.
    pub fn get_observed_tx_voter(&self, tx_id: &TxId) -> Result<ObservedTxVoter, KeeperError> {
        Ok(self
            .fetch(&Self::voter_key(tx_id))?
            .unwrap_or_else(|| ObservedTxVoter::new(tx_id.clone())))
    }

    /// Persist the voter.
    pub fn set_observed_tx_voter(&mut self, voter: &ObservedTxVoter) -> Result<(), KeeperError> {
        self.put(&Self::voter_key(&voter.tx_id), voter)
    }

    /// Fetch the errata voter for `(tx_id, chain)`, creating an empty one
    /// when absent.
    pub fn get_errata_tx_voter(
        &self,
        tx_id: &TxId,
        chain: Chain,
    ) -> Result<ErrataTxVoter, KeeperError> {
        Ok(self
            .fetch(&Self::errata_key(tx_id, chain))?
            .unwrap_or_else(|| ErrataTxVoter::new(tx_id.clone(), chain)))
    }

    /// Persist the errata voter.
    pub fn set_errata_tx_voter(&mut self, voter: &ErrataTxVoter) -> Result<(), KeeperError> {
        self.put(&Self::errata_key(&voter.tx_id, voter.chain), voter)
    }

    /// Record addresses that observed something this block. Appends,
    /// dedupes, keeps sorted order.
    pub fn add_observing_addresses(
        &mut self,
        addrs: &[NodeAddress],
    ) -> Result<(), KeeperError> {
        let mut current = self.get_observing_addresses()?;
        for addr in addrs {
            if !current.contains(addr) {
                current.push(addr.clone());
            }
        }
        current.sort();
        self.put(keys::OBSERVING_ADDRESSES, &current)
    }

    /// Addresses that observed something this block.
    pub fn get_observing_addresses(&self) -> Result<Vec<NodeAddress>, KeeperError> {
        Ok(self.fetch(keys::OBSERVING_ADDRESSES)?.unwrap_or_default())
    }

    /// Reset the per-block observing set.
    pub fn clear_observing_addresses(&mut self) -> Result<(), KeeperError> {
        self.remove(keys::OBSERVING_ADDRESSES)
    }

    /// Flag the address as a registered observer.
    pub fn set_active_observer(&mut self, addr: &NodeAddress) -> Result<(), KeeperError> {
        self.put(&format!("{}{}", keys::ACTIVE_OBSERVER, addr), &true)
    }

    /// Whether the address is a registered observer.
    pub fn is_active_observer(&self, addr: &NodeAddress) -> Result<bool, KeeperError> {
        self.exists(&format!("{}{}", keys::ACTIVE_OBSERVER, addr))
    }

    /// Remove the observer flag.
    pub fn remove_active_observer(&mut self, addr: &NodeAddress) -> Result<(), KeeperError> {
        self.remove(&format!("{}{}", keys::ACTIVE_OBSERVER, addr))
    }
}

#[cfg(test)]
mod tests {
    use crate::adapters::MemoryStore;
    use crate::keeper::Keeper;
    use shared_types::{Chain, NodeAddress, TxId};

    fn keeper() -> Keeper {
        Keeper::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_voter_round_trip() {
        let mut keeper = keeper();
        let id = TxId::from_hash(b"in");
        let mut voter = keeper.get_observed_tx_voter(&id).unwrap();
        assert_eq!(voter.height, 0);
        voter.height = 12;
        keeper.set_observed_tx_voter(&voter).unwrap();
        assert_eq!(keeper.get_observed_tx_voter(&id).unwrap().height, 12);
    }

    #[test]
    fn test_errata_voter_keyed_per_chain() {
        let mut keeper = keeper();
        let id = TxId::from_hash(b"in");
        let mut voter = keeper.get_errata_tx_voter(&id, Chain::Bnb).unwrap();
        voter.block_height = 3;
        keeper.set_errata_tx_voter(&voter).unwrap();
        assert_eq!(
            keeper.get_errata_tx_voter(&id, Chain::Bnb).unwrap().block_height,
            3
        );
        assert_eq!(
            keeper.get_errata_tx_voter(&id, Chain::Btc).unwrap().block_height,
            0
        );
    }

    #[test]
    fn test_observing_addresses() {
        let mut keeper = keeper();
        keeper
            .add_observing_addresses(&[NodeAddress::new("rune1b"), NodeAddress::new("rune1a")])
            .unwrap();
        keeper
            .add_observing_addresses(&[NodeAddress::new("rune1a")])
            .unwrap();
        let addrs = keeper.get_observing_addresses().unwrap();
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0], NodeAddress::new("rune1a"));

        keeper.clear_observing_addresses().unwrap();
        assert!(keeper.get_observing_addresses().unwrap().is_empty());
    }

    #[test]
    fn test_active_observer_flag() {
        let mut keeper = keeper();
        let addr = NodeAddress::new("rune1watcher");
        assert!(!keeper.is_active_observer(&addr).unwrap());
        keeper.set_active_observer(&addr).unwrap();
        assert!(keeper.is_active_observer(&addr).unwrap());
        keeper.remove_active_observer(&addr).unwrap();
        assert!(!keeper.is_active_observer(&addr).unwrap());
    }
}

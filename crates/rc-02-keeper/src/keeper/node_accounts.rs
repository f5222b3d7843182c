//! Node account persistence.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::{NodeAccount, NodeAddress, NodeStatus, PubKey, Version};

impl Keeper {
    fn node_key(addr: &NodeAddress) -> String {
        format!("{}{}", keys::NODE, addr)
    }

    /// Whether the node account exists.
    pub fn node_account_exists(&self, addr: &NodeAddress) -> Result<bool, KeeperError> {
        self.exists(&Self::node_key(addr))
    }

    /// Fetch the node account, or an empty record carrying the address.
    pub fn get_node_account(&self, addr: &NodeAddress) -> Result<NodeAccount, KeeperError> {
        Ok(self.fetch(&Self::node_key(addr))?.unwrap_or_else(|| {
            let mut na = NodeAccount::default();
            na.node_address = addr.clone();
            na
        }))
    }

    /// Find the node account owning the given node pubkey, if any.
    pub fn get_node_account_by_pub_key(
        &self,
        pub_key: &PubKey,
    ) -> Result<Option<NodeAccount>, KeeperError> {
        Ok(self
            .list_node_accounts()?
            .into_iter()
            .find(|na| &na.pub_key_set.node_pub_key == pub_key))
    }

    /// Persist the node account.
    pub fn set_node_account(&mut self, na: &NodeAccount) -> Result<(), KeeperError> {
        self.put(&Self::node_key(&na.node_address), na)
    }

    /// All node accounts, in address order.
    pub fn list_node_accounts(&self) -> Result<Vec<NodeAccount>, KeeperError> {
        self.scan(keys::NODE)
    }

    /// All node accounts in the given status.
    pub fn list_node_accounts_by_status(
        &self,
        status: NodeStatus,
    ) -> Result<Vec<NodeAccount>, KeeperError> {
        Ok(self
            .list_node_accounts()?
            .into_iter()
            .filter(|na| na.status == status)
            .collect())
    }

    /// All active node accounts.
    pub fn list_active_node_accounts(&self) -> Result<Vec<NodeAccount>, KeeperError> {
        self.list_node_accounts_by_status(NodeStatus::Active)
    }

    /// Count of active node accounts.
    pub fn total_active_node_accounts(&self) -> Result<usize, KeeperError> {
        Ok(self.list_active_node_accounts()?.len())
    }

    /// The lowest version reported across active nodes; the dispatch
    /// gate. Defaults to the genesis version while the set is empty.
    pub fn get_min_active_version(&self) -> Result<Version, KeeperError> {
        Ok(self
            .list_active_node_accounts()?
            .iter()
            .map(|na| na.version)
            .min()
            .unwrap_or_else(|| Version::new(0, 1, 0)))
    }

    /// Sum of bond across active nodes.
    pub fn total_active_bond(&self) -> Result<u128, KeeperError> {
        Ok(self
            .list_active_node_accounts()?
            .iter()
            .map(|na| na.bond)
            .sum())
    }
}

//! Genesis state: the initial validator set, vault, and reserve.

use rc_02_keeper::Keeper;
use rc_02_keeper::KeeperError;
use shared_types::{
    Address, NodeAccount, NodeAddress, NodePubKeys, NodeStatus, PubKey, Vault, VaultData,
    VaultStatus, VaultType, Version,
};
use tracing::info;

/// One genesis validator.
#[derive(Clone, Debug)]
pub struct GenesisNode {
    /// Operator address.
    pub node_address: NodeAddress,
    /// Signing key.
    pub node_pub_key: PubKey,
    /// Consensus key.
    pub validator_cons_pub_key: PubKey,
    /// Initial bond in RUNE.
    pub bond: u128,
    /// Bond refund address.
    pub bond_address: Address,
}

/// Initial network state.
#[derive(Clone, Debug)]
pub struct GenesisConfig {
    /// The starting validator set; all begin Active.
    pub nodes: Vec<GenesisNode>,
    /// The first asgard vault's pubkey.
    pub asgard_pub_key: PubKey,
    /// Initial protocol reserve in RUNE.
    pub reserve: u128,
    /// The software version every genesis node reports.
    pub version: Version,
}

impl GenesisConfig {
    /// Write the genesis state. Runs once, at height zero.
    pub fn apply(&self, keeper: &mut Keeper) -> Result<(), KeeperError> {
        for genesis_node in &self.nodes {
            let mut na = NodeAccount::new(
                genesis_node.node_address.clone(),
                NodeStatus::Active,
                NodePubKeys {
                    node_pub_key: genesis_node.node_pub_key.clone(),
                    validator_cons_pub_key: genesis_node.validator_cons_pub_key.clone(),
                },
                genesis_node.bond,
                genesis_node.bond_address.clone(),
                0,
            );
            na.version = self.version;
            keeper.set_node_account(&na)?;
            keeper.set_active_observer(&genesis_node.node_address)?;
        }

        let vault = Vault::new(
            VaultType::Asgard,
            VaultStatus::Active,
            0,
            self.asgard_pub_key.clone(),
        );
        keeper.set_vault(&vault)?;

        let mut vault_data = VaultData::new();
        vault_data.total_reserve = self.reserve;
        keeper.set_vault_data(&vault_data)?;

        info!(
            nodes = self.nodes.len(),
            reserve = self.reserve,
            "genesis state applied"
        );
        Ok(())
    }
}

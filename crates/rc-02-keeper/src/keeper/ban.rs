//! Ban voters: supermajority votes to force a misbehaving node out.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use serde::{Deserialize, Serialize};
use shared_types::{has_super_majority, NodeAddress};
use std::collections::BTreeSet;

/// Vote accumulator for banning one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BanVoter {
    /// The node up for a ban.
    pub node_address: NodeAddress,
    /// Native height consensus first formed; zero until then.
    pub block_height: u64,
    /// Nodes that voted for the ban.
    pub signers: BTreeSet<NodeAddress>,
}

impl BanVoter {
    /// Create a voter for the node.
    pub fn new(node_address: NodeAddress) -> Self {
        Self {
            node_address,
            ..Default::default()
        }
    }

    /// Add a signer; idempotent.
    pub fn sign(&mut self, signer: NodeAddress) -> bool {
        self.signers.insert(signer)
    }

    /// Whether the ban reached supermajority.
    pub fn has_consensus(&self, active: usize) -> bool {
        has_super_majority(self.signers.len(), active)
    }
}

impl Keeper {
    /// Fetch the ban voter for a node, creating an empty one when absent.
    pub fn get_ban_voter(&self, addr: &NodeAddress) -> Result<BanVoter, KeeperError> {
        Ok(self
            .fetch(&format!("{}{}", keys::BAN_VOTER, addr))?
            .unwrap_or_else(|| BanVoter::new(addr.clone())))
    }

    /// Persist the ban voter.
    pub fn set_ban_voter(&mut self, voter: &BanVoter) -> Result<(), KeeperError> {
        self.put(&format!("{}{}", keys::BAN_VOTER, voter.node_address), voter)
    }
}

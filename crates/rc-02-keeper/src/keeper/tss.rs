//! TSS voters: agreement that a keygen ceremony produced a pool pubkey
//! (or failed with a blame list).

use super::{keys, Keeper};
use crate::errors::KeeperError;
use serde::{Deserialize, Serialize};
use shared_types::{has_super_majority, NodeAddress, PubKey};
use std::collections::BTreeSet;

/// Vote accumulator for one keygen result, keyed by the ceremony id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TssVoter {
    /// Ceremony identifier (hash of the member set).
    pub id: String,
    /// The produced pool pubkey; empty on failure reports.
    pub pool_pub_key: PubKey,
    /// Member pubkeys of the ceremony.
    pub pub_keys: Vec<PubKey>,
    /// Native height consensus first formed; zero until then.
    pub block_height: u64,
    /// Nodes that reported this result.
    pub signers: BTreeSet<NodeAddress>,
}

impl TssVoter {
    /// Create a voter for the ceremony.
    pub fn new(id: String, pool_pub_key: PubKey, pub_keys: Vec<PubKey>) -> Self {
        Self {
            id,
            pool_pub_key,
            pub_keys,
            ..Default::default()
        }
    }

    /// Add a signer; idempotent.
    pub fn sign(&mut self, signer: NodeAddress) -> bool {
        self.signers.insert(signer)
    }

    /// Whether the result reached supermajority.
    pub fn has_consensus(&self, active: usize) -> bool {
        has_super_majority(self.signers.len(), active)
    }
}

impl Keeper {
    /// Fetch the TSS voter for the ceremony id, if recorded.
    pub fn get_tss_voter(&self, id: &str) -> Result<Option<TssVoter>, KeeperError> {
        self.fetch(&format!("{}{}", keys::TSS_VOTER, id))
    }

    /// Persist the TSS voter.
    pub fn set_tss_voter(&mut self, voter: &TssVoter) -> Result<(), KeeperError> {
        self.put(&format!("{}{}", keys::TSS_VOTER, voter.id), voter)
    }
}

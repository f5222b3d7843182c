//! # Observed transactions
//!
//! Witness records for foreign-chain transactions and the voters that
//! accumulate them until the active node set reaches supermajority.
//!
//! Byzantine observers may report differing content for the same tx id, so
//! a voter keeps one bucket per distinct `(tx, observed_pub_key)` pair and
//! counts signers per bucket.

use crate::tx::{NodeAddress, PubKey, Tx, TxId};
use crate::tx_out::TxOutItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Supermajority threshold: `signers >= ceil(2 * active / 3)`.
pub fn has_super_majority(signers: usize, active: usize) -> bool {
    active > 0 && signers * 3 >= active * 2
}

/// One reported version of a foreign-chain transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObservedTx {
    /// The witnessed transaction.
    pub tx: Tx,
    /// Foreign-chain block height it was seen at.
    pub block_height: u64,
    /// The vault key the funds were observed against.
    pub observed_pub_key: PubKey,
    /// Nodes that reported exactly this content.
    pub signers: BTreeSet<NodeAddress>,
}

impl ObservedTx {
    /// Create a witness record.
    pub fn new(tx: Tx, block_height: u64, observed_pub_key: PubKey) -> Self {
        Self {
            tx,
            block_height,
            observed_pub_key,
            signers: BTreeSet::new(),
        }
    }

    /// Content equality, ignoring the signer set.
    pub fn equals(&self, other: &ObservedTx) -> bool {
        self.tx == other.tx
            && self.block_height == other.block_height
            && self.observed_pub_key == other.observed_pub_key
    }

    /// Whether the node already signed this version.
    pub fn has_signed(&self, signer: &NodeAddress) -> bool {
        self.signers.contains(signer)
    }

    /// Add a signer. Returns false when it was already present.
    pub fn sign(&mut self, signer: NodeAddress) -> bool {
        self.signers.insert(signer)
    }
}

/// Vote accumulator for one foreign tx id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObservedTxVoter {
    /// The foreign tx id voted on.
    pub tx_id: TxId,
    /// Reported versions, one bucket per distinct content.
    pub txs: Vec<ObservedTx>,
    /// Native block height consensus first formed; zero until then.
    pub height: u64,
    /// Outbound follow-ups scheduled once the memo was acted on.
    pub actions: Vec<TxOutItem>,
    /// Observed outbound transactions, matched against `actions`.
    pub out_txs: Vec<Tx>,
}

impl ObservedTxVoter {
    /// Create a voter for the tx id.
    pub fn new(tx_id: TxId) -> Self {
        Self {
            tx_id,
            ..Default::default()
        }
    }

    /// Record a witness from a node. Creates the content bucket when this
    /// version has not been reported before. Idempotent per
    /// `(version, signer)`, and signer-order independent.
    ///
    /// Returns true when the vote changed the record.
    pub fn add(&mut self, observed: ObservedTx, signer: NodeAddress) -> bool {
        for tx in self.txs.iter_mut() {
            if tx.equals(&observed) {
                return tx.sign(signer);
            }
        }
        let mut observed = observed;
        observed.signers.clear();
        observed.sign(signer);
        self.txs.push(observed);
        true
    }

    /// Whether any reported version reached supermajority of the active
    /// set.
    pub fn has_consensus(&self, active: usize) -> bool {
        self.txs
            .iter()
            .any(|tx| has_super_majority(tx.signers.len(), active))
    }

    /// The version that reached supermajority, if any.
    pub fn consensus_tx(&self, active: usize) -> Option<&ObservedTx> {
        self.txs
            .iter()
            .find(|tx| has_super_majority(tx.signers.len(), active))
    }

    /// Record an observed outbound tx, filling the `out_hash` of every
    /// matching action. Returns false for duplicates and non-matching txs.
    pub fn add_out_tx(&mut self, out: Tx) -> bool {
        if self.out_txs.iter().any(|t| t.id == out.id) {
            return false;
        }
        let mut matched = false;
        for action in self.actions.iter_mut() {
            if !action.out_hash.is_empty() {
                continue;
            }
            let coin_match = out.coins.amount_of(&action.coin.asset) >= action.coin.amount;
            if action.to_address == out.to_address && coin_match {
                action.out_hash = out.id.clone();
                matched = true;
                break;
            }
        }
        if matched {
            self.out_txs.push(out);
        }
        matched
    }

    /// Whether all scheduled actions have been answered by outbound
    /// observations.
    pub fn is_done(&self) -> bool {
        !self.actions.is_empty() && self.out_txs.len() >= self.actions.len()
    }
}

/// Vote accumulator for retroactive corrections, keyed `(tx_id, chain)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ErrataTxVoter {
    /// The disputed tx id.
    pub tx_id: TxId,
    /// Chain the correction applies to.
    pub chain: crate::chain::Chain,
    /// Native block height consensus first formed; zero until then.
    pub block_height: u64,
    /// Nodes that voted for the correction.
    pub signers: BTreeSet<NodeAddress>,
}

impl ErrataTxVoter {
    /// Create a voter for the `(tx_id, chain)` pair.
    pub fn new(tx_id: TxId, chain: crate::chain::Chain) -> Self {
        Self {
            tx_id,
            chain,
            ..Default::default()
        }
    }

    /// Add a signer; idempotent.
    pub fn sign(&mut self, signer: NodeAddress) -> bool {
        self.signers.insert(signer)
    }

    /// Whether the correction reached supermajority.
    pub fn has_consensus(&self, active: usize) -> bool {
        has_super_majority(self.signers.len(), active)
    }
}

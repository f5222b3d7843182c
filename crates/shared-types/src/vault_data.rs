//! # Vault data
//!
//! The global accumulator: protocol reserve, undistributed bond rewards,
//! bond units, and the foreign-chain gas owed back to pools.

use crate::coin::Gas;
use crate::tx::Address;
use serde::{Deserialize, Serialize};

/// Global reward and reserve accumulator, a singleton in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VaultData {
    /// Protocol treasury in RUNE.
    pub total_reserve: u128,
    /// RUNE earmarked for bonders, paid out per node on leaving Active.
    pub bond_reward_rune: u128,
    /// One unit per active node per block; the denominator of bond payouts.
    pub total_bond_units: u128,
    /// Foreign-chain miner fees consumed, owed back to pools in RUNE.
    pub gas: Gas,
}

impl VaultData {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A contributor to the protocol reserve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReserveContributor {
    /// Contributor address.
    pub address: Address,
    /// Total RUNE contributed.
    pub amount: u128,
}

impl ReserveContributor {
    /// Create a contribution record.
    pub fn new(address: Address, amount: u128) -> Self {
        Self { address, amount }
    }

    /// Whether the record is structurally valid.
    pub fn is_valid(&self) -> bool {
        !self.address.is_empty() && self.amount > 0
    }
}

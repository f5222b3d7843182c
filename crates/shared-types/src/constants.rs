//! # Network constants
//!
//! Default network parameters. Individual values can be overridden at
//! runtime by the operator mimir layer, consulted through the keeper.

use serde::{Deserialize, Serialize};

/// Network parameters with their default values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constants {
    /// Reserve fraction emitted per year (reserve / curve / blocks).
    pub emission_curve: u128,
    /// Native blocks per year.
    pub blocks_per_year: u128,
    /// Flat fee on outbound transactions, in RUNE base units.
    pub transaction_fee: u128,
    /// Upper bound for unstake basis points.
    pub max_unstake_basis_points: u64,
    /// Minimum active nodes before fees are charged and the network is
    /// considered byzantine-fault tolerant.
    pub minimum_nodes_for_bft: usize,
    /// Minimum nodes before yggdrasil vaults are funded.
    pub minimum_nodes_for_yggdrasil: usize,
    /// Target validator set size.
    pub desire_validator_set: usize,
    /// How many validators to rotate in per churn before the target size
    /// is reached.
    pub validator_rotate_in_num_before_full: usize,
    /// Blocks between validator rotations.
    pub rotate_per_block_height: u64,
    /// Slash points per block for an active node that observed nothing.
    pub lack_of_observation_penalty: u64,
    /// Blocks before an unsigned outbound item is delinquent.
    pub signing_transaction_period: u64,
    /// Slash points for a node blamed in a failed keygen.
    pub fail_keygen_slash_points: u64,
    /// Slash points for a node blamed in a failed keysign.
    pub fail_key_sign_slash_points: u64,
    /// Blocks a staker is locked up after staking on a slow chain.
    pub stake_lock_up_blocks: u64,
    /// Queue length below which every queued swap drains each block.
    pub min_swaps_per_block: usize,
    /// Hard cap on swaps drained per block.
    pub max_swaps_per_block: usize,
    /// Gas units left behind in a migrating vault per non-gas asset, to
    /// pay the foreign miner fee.
    pub pool_refund_gas: u128,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            emission_curve: 6,
            blocks_per_year: 6_311_390,
            transaction_fee: 100_000_000, // a 1.0 RUNE fee on swaps and withdrawals
            max_unstake_basis_points: 10_000,
            minimum_nodes_for_bft: 4,
            minimum_nodes_for_yggdrasil: 6,
            desire_validator_set: 33,
            validator_rotate_in_num_before_full: 2,
            rotate_per_block_height: 51_840,
            lack_of_observation_penalty: 2,
            signing_transaction_period: 300,
            fail_keygen_slash_points: 720,
            fail_key_sign_slash_points: 2,
            stake_lock_up_blocks: 17_280, // 24 hours
            min_swaps_per_block: 10,
            max_swaps_per_block: 100,
            pool_refund_gas: 37_500,
        }
    }
}

/// Mimir override key names, shared between the keeper and the handlers.
pub mod mimir_keys {
    /// Override for [`super::Constants::transaction_fee`].
    pub const TRANSACTION_FEE: &str = "TransactionFee";
    /// Override for [`super::Constants::rotate_per_block_height`].
    pub const ROTATE_PER_BLOCK_HEIGHT: &str = "RotatePerBlockHeight";
    /// Override for [`super::Constants::desire_validator_set`].
    pub const DESIRE_VALIDATOR_SET: &str = "DesireValidatorSet";
    /// Global ragnarok trigger.
    pub const RAGNAROK: &str = "Ragnarok";
}

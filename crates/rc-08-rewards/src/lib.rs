//! # RC-08 Reward Engine
//!
//! EndBlock economics: emits a block reward from the reserve, splits the
//! system income between stakers and bonders on the 0%/33%/100% incentive
//! curve, reimburses pools for foreign-chain gas, and pays each node its
//! accrued bond reward when it leaves the active set.
//!
//! ```text
//! block_reward = reserve / emission_curve / blocks_per_year
//! system_income = block_reward + liquidity_fees_this_block
//! staker_share  = system_income * (bonded - staked) / (bonded + staked)
//!                 (zero when staked >= bonded)
//! bonder_share  = system_income - staker_share
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod errors;

pub use engine::{calc_block_reward, calc_staker_share, pay_node_bond_award, update_vault_data};
pub use errors::RewardError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

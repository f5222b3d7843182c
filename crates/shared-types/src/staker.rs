//! # Staker
//!
//! A liquidity provider's position in one pool. Created on first stake,
//! destroyed when units reach zero on unstake.

use crate::asset::Asset;
use crate::tx::Address;
use serde::{Deserialize, Serialize};

/// A staker record, keyed by `(asset, rune_address)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Staker {
    /// The pool asset.
    pub asset: Asset,
    /// The staker's native-chain address; the identity of the position.
    pub rune_address: Address,
    /// The staker's address on the asset chain. Fixed after the first
    /// cross-chain stake; later stakes must match.
    pub asset_address: Address,
    /// Share of `pool.pool_units` owned.
    pub units: u128,
    /// One-sided RUNE deposits awaiting the matching asset deposit.
    pub pending_rune: u128,
    /// Height of the most recent stake; basis of the unstake lockup.
    pub last_stake_height: u64,
    /// Height of the most recent unstake.
    pub last_unstake_height: u64,
}

impl Staker {
    /// Create an empty position for the pool.
    pub fn new(asset: Asset, rune_address: Address) -> Self {
        Self {
            asset,
            rune_address,
            ..Default::default()
        }
    }

    /// Whether the record holds nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        self.units == 0 && self.pending_rune == 0
    }
}

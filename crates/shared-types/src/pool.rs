//! # Pool
//!
//! A constant-product liquidity pool pairing RUNE with one foreign asset.
//!
//! Invariants:
//! - `balance_rune == 0` iff `pool_units == 0` iff the pool has no stakers.
//! - `Enabled` is required for swaps and new stakes; `Bootstrap` accepts
//!   stakes but not swaps; `Suspended` blocks all user action.

use crate::asset::Asset;
use crate::uint::mul_div;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pool lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    /// Accepting swaps and stakes.
    #[default]
    Enabled,
    /// Accepting stakes, not yet swappable.
    Bootstrap,
    /// All user action blocked.
    Suspended,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PoolStatus::Enabled => "Enabled",
            PoolStatus::Bootstrap => "Bootstrap",
            PoolStatus::Suspended => "Suspended",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PoolStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enabled" => Ok(PoolStatus::Enabled),
            "bootstrap" => Ok(PoolStatus::Bootstrap),
            "suspended" => Ok(PoolStatus::Suspended),
            _ => Err(format!("unknown pool status: {s}")),
        }
    }
}

/// A liquidity pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// The pooled foreign asset.
    pub asset: Asset,
    /// RUNE depth.
    pub balance_rune: u128,
    /// Asset depth.
    pub balance_asset: u128,
    /// Total share units issued to stakers.
    pub pool_units: u128,
    /// Lifecycle status.
    pub status: PoolStatus,
}

impl Pool {
    /// Create an empty pool for the asset, in the default status.
    pub fn new(asset: Asset) -> Self {
        Self {
            asset,
            balance_rune: 0,
            balance_asset: 0,
            pool_units: 0,
            status: PoolStatus::Enabled,
        }
    }

    /// Whether the pool has no liquidity on either side.
    pub fn is_empty(&self) -> bool {
        self.balance_rune == 0 && self.balance_asset == 0
    }

    /// Whether the pool accepts swaps.
    pub fn is_enabled(&self) -> bool {
        self.status == PoolStatus::Enabled
    }

    /// Value the given asset amount in RUNE at the current pool ratio.
    pub fn asset_value_in_rune(&self, amount: u128) -> u128 {
        mul_div(amount, self.balance_rune, self.balance_asset)
    }

    /// Value the given RUNE amount in the pool asset at the current ratio.
    pub fn rune_value_in_asset(&self, amount: u128) -> u128 {
        mul_div(amount, self.balance_asset, self.balance_rune)
    }
}

//! # RC-03 AMM Engine
//!
//! Constant-product swap, stake, and unstake math, plus the pool
//! mutations that go with them.
//!
//! For a pool `{X, Y}` where `X` is the input-side depth and `Y` the
//! output-side depth, an input `x` yields:
//!
//! ```text
//! emission      =  x * X * Y / (x + X)^2
//! liquidity fee =  x^2 * Y   / (x + X)^2
//! trade slip    =  x * (2X + x) / X^2       (in basis points)
//! ```
//!
//! Swaps that cross the native boundary report the liquidity fee in RUNE.
//! Double swaps route `source -> RUNE -> target` through two pools and
//! emit one swap event per hop.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod stake;
pub mod swap;
pub mod unstake;

pub use errors::{StakeError, SwapError, UnstakeError};
pub use stake::{calculate_pool_units, stake, StakeInputs};
pub use swap::{calc_asset_emission, calc_liquidity_fee, calc_trade_slip_bps, swap};
pub use unstake::{calculate_unstake, unstake};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}

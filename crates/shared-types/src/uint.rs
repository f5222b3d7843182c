//! # Amount math
//!
//! All amounts are `u128` in 1e-8 base units. Products of two or three
//! amounts can exceed `u128`, so share and pool math is computed through
//! `U256` with truncating division.

use primitive_types::U256;

/// One full unit of any asset (10^8 base units).
pub const ONE: u128 = 100_000_000;

/// `a - b`, floored at zero.
pub fn safe_sub(a: u128, b: u128) -> u128 {
    a.saturating_sub(b)
}

/// `value * numerator / denominator` with a U256 intermediate.
/// Returns 0 when the denominator is zero.
pub fn mul_div(value: u128, numerator: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        return 0;
    }
    let result = U256::from(value) * U256::from(numerator) / U256::from(denominator);
    result.as_u128()
}

/// The share of `allocation` that `part / total` represents.
pub fn get_share(part: u128, total: u128, allocation: u128) -> u128 {
    mul_div(allocation, part, total)
}

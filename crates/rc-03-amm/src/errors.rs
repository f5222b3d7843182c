//! # AMM errors
//!
//! Each variant corresponds to one rejection code at the handler boundary.

use rc_02_keeper::KeeperError;
use thiserror::Error;

/// Swap failures.
#[derive(Debug, Error)]
pub enum SwapError {
    /// The message was structurally invalid.
    #[error("invalid swap message: {0}")]
    Validation(String),

    /// The pool is missing or not enabled for swaps.
    #[error("pool {0} doesn't exist or can't swap")]
    PoolNotExist(String),

    /// One side of the pool has zero depth.
    #[error("invalid balance")]
    InvalidBalance,

    /// The input amount is zero.
    #[error("amount is invalid")]
    InvalidAmount,

    /// The emission came in under the caller's price floor.
    #[error("emit asset {emit} less than price limit {target}")]
    TradeTarget {
        /// What the swap produced.
        emit: u128,
        /// The caller's floor.
        target: u128,
    },

    /// A RUNE output too small to cover the transaction fee.
    #[error("output RUNE {0} is not enough to cover the transaction fee")]
    NotEnoughFee(u128),

    /// The swap would emit nothing.
    #[error("zero emit asset")]
    ZeroEmit,

    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),
}

/// Stake failures.
#[derive(Debug, Error)]
pub enum StakeError {
    /// The message was structurally invalid.
    #[error("invalid stake message: {0}")]
    Validation(String),

    /// The pool does not accept user action.
    #[error("pool {0} is suspended")]
    PoolSuspended(String),

    /// The asset address differs from the one on record.
    #[error("mismatch of asset addresses")]
    MismatchAssetAddress,

    /// Pool-unit math failed (zero totals).
    #[error("fail to calculate pool units: {0}")]
    InvalidPoolUnits(String),

    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),
}

/// Unstake failures.
#[derive(Debug, Error)]
pub enum UnstakeError {
    /// The message was structurally invalid.
    #[error("invalid unstake message: {0}")]
    Validation(String),

    /// The pool does not accept user action.
    #[error("pool {0} is suspended")]
    PoolSuspended(String),

    /// The staker record does not exist.
    #[error("staker doesn't exist")]
    StakerNotExist,

    /// The staker has no units to withdraw.
    #[error("nothing to withdraw")]
    NoStakeUnitLeft,

    /// The position is still inside the lockup window.
    #[error("you cannot unstake for {0} blocks after staking for this blockchain")]
    WithinLockup(u64),

    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),
}

//! # Handler results
//!
//! Every handler returns a [`HandlerResult`] rather than an error: the
//! state machine never aborts block production over a rejected message.

use rc_03_amm::{StakeError, SwapError, UnstakeError};
use serde::{Deserialize, Serialize};

/// Rejection codes reported on the transaction result log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum ResultCode {
    /// Accepted.
    Ok = 0,
    /// Storage or encoding failure inside the handler.
    Internal = 1,
    /// The signer lacks authority for this message class.
    Unauthorized = 4,
    /// The message is malformed or its type unsupported.
    UnknownRequest = 6,
    /// An address failed validation.
    InvalidAddress = 7,
    /// The pool's status forbids the action.
    InvalidPoolStatus = 103,
    /// The version gate rejected the message.
    BadVersion = 101,
    /// Generic structural failure.
    InvalidMessage = 105,
    /// Swap: pool missing or unswappable.
    SwapFailPoolNotExist = 108,
    /// Swap: emission under the price floor.
    SwapFailTradeTarget = 109,
    /// Swap: RUNE output below the transaction fee.
    SwapFailNotEnoughFee = 110,
    /// Swap: zero input.
    SwapFailInvalidAmount = 111,
    /// Swap: empty pool side.
    SwapFailInvalidBalance = 112,
    /// Swap: zero output.
    SwapFailZeroEmit = 113,
    /// Stake rejected.
    StakeFailValidation = 120,
    /// Stake exceeds the global RUNE cap.
    StakeRuneOverLimit = 121,
    /// Stake exceeds the bonded RUNE.
    StakeRuneMoreThanBond = 122,
    /// Unstake rejected.
    UnstakeFailValidation = 125,
    /// Unstake: no units left.
    NoStakeUnitLeft = 126,
    /// Unstake: unknown staker.
    StakerNotExist = 127,
    /// Staker record could not be loaded.
    FailGetStaker = 128,
    /// Event persistence failed.
    FailSaveEvent = 130,
    /// Outbound scheduling failed.
    FailAddOutboundTx = 131,
}

/// The outcome a handler reports to the host runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerResult {
    /// Result code.
    pub code: ResultCode,
    /// Human-readable log line; empty on success.
    pub log: String,
}

impl HandlerResult {
    /// A success result.
    pub fn ok() -> Self {
        Self {
            code: ResultCode::Ok,
            log: String::new(),
        }
    }

    /// A rejection with a log line.
    pub fn error(code: ResultCode, log: impl Into<String>) -> Self {
        Self {
            code,
            log: log.into(),
        }
    }

    /// Whether the message was accepted.
    pub fn is_ok(&self) -> bool {
        self.code == ResultCode::Ok
    }
}

impl From<&SwapError> for ResultCode {
    fn from(err: &SwapError) -> Self {
        match err {
            SwapError::Validation(_) => ResultCode::InvalidMessage,
            SwapError::PoolNotExist(_) => ResultCode::SwapFailPoolNotExist,
            SwapError::InvalidBalance => ResultCode::SwapFailInvalidBalance,
            SwapError::InvalidAmount => ResultCode::SwapFailInvalidAmount,
            SwapError::TradeTarget { .. } => ResultCode::SwapFailTradeTarget,
            SwapError::NotEnoughFee(_) => ResultCode::SwapFailNotEnoughFee,
            SwapError::ZeroEmit => ResultCode::SwapFailZeroEmit,
            SwapError::Keeper(_) => ResultCode::Internal,
        }
    }
}

impl From<&StakeError> for ResultCode {
    fn from(err: &StakeError) -> Self {
        match err {
            StakeError::Validation(_) => ResultCode::StakeFailValidation,
            StakeError::PoolSuspended(_) => ResultCode::InvalidPoolStatus,
            StakeError::MismatchAssetAddress => ResultCode::StakeFailValidation,
            StakeError::InvalidPoolUnits(_) => ResultCode::StakeFailValidation,
            StakeError::Keeper(_) => ResultCode::Internal,
        }
    }
}

impl From<&UnstakeError> for ResultCode {
    fn from(err: &UnstakeError) -> Self {
        match err {
            UnstakeError::Validation(_) => ResultCode::UnstakeFailValidation,
            UnstakeError::PoolSuspended(_) => ResultCode::InvalidPoolStatus,
            UnstakeError::StakerNotExist => ResultCode::StakerNotExist,
            UnstakeError::NoStakeUnitLeft => ResultCode::NoStakeUnitLeft,
            UnstakeError::WithinLockup(_) => ResultCode::UnstakeFailValidation,
            UnstakeError::Keeper(_) => ResultCode::Internal,
        }
    }
}

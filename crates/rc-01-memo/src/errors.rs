//! # Memo errors

use thiserror::Error;

/// Memo parse failures. Every variant maps to the `InvalidMemo` rejection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoError {
    /// The memo string was empty.
    #[error("memo can't be empty")]
    Empty,

    /// The leading type field is not in the supported set.
    #[error("invalid tx type: {0}")]
    UnknownType(String),

    /// A required argument was missing.
    #[error("cannot parse memo: missing {0}")]
    MissingField(&'static str),

    /// The asset argument did not parse.
    #[error("invalid asset in memo: {0}")]
    InvalidAsset(String),

    /// The address argument did not parse.
    #[error("invalid address in memo: {0}")]
    InvalidAddress(String),

    /// Basis points were zero or above 10000.
    #[error("withdraw basis points {0} is invalid")]
    InvalidBasisPoints(String),

    /// A numeric argument did not parse.
    #[error("invalid number in memo: {0}")]
    InvalidNumber(String),

    /// A tx id argument did not parse.
    #[error("invalid tx id in memo: {0}")]
    InvalidTxId(String),

    /// A cross-chain stake arrived without an asset address.
    #[error("cannot stake to a pool on {0} without an associated asset address")]
    StakeAddressRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoError::UnknownType("gift".to_string());
        assert!(err.to_string().contains("gift"));
        let err = MemoError::InvalidBasisPoints("10001".to_string());
        assert!(err.to_string().contains("10001"));
    }
}

//! # Type errors
//!
//! Parse and structural-validation failures for the shared primitives.

use thiserror::Error;

/// Errors produced when constructing shared types from wire strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The chain string is not in the supported set.
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    /// The asset string is not CHAIN.SYMBOL.
    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    /// The tx id is not 64 hex characters.
    #[error("invalid tx id: {0}")]
    InvalidTxId(String),

    /// The address is structurally invalid.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A transaction failed structural validation.
    #[error("invalid tx: {0}")]
    InvalidTx(String),

    /// A version string is not MAJOR.MINOR.PATCH.
    #[error("invalid version: {0}")]
    InvalidVersion(String),
}

//! # TxOut errors

use rc_02_keeper::KeeperError;
use thiserror::Error;

/// Outbound scheduling failures.
#[derive(Debug, Error)]
pub enum TxOutError {
    /// No vault can fund the item.
    #[error("no vault can fund {0}")]
    NoVaultAvailable(String),

    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),
}

//! # Swap queue errors

use rc_02_keeper::KeeperError;
use rc_06_txout::TxOutError;
use thiserror::Error;

/// Queue processing failures.
#[derive(Debug, Error)]
pub enum SwapQueueError {
    /// Outbound scheduling failure.
    #[error(transparent)]
    TxOut(#[from] TxOutError),

    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),
}

//! # Vault manager errors

use rc_02_keeper::KeeperError;
use rc_06_txout::TxOutError;
use thiserror::Error;

/// Vault lifecycle failures.
#[derive(Debug, Error)]
pub enum VaultError {
    /// A yggdrasil top-up would exceed the node's bonded collateral.
    #[error("exceeded safe amounts of assets for given yggdrasil vault ({counter}/{cap})")]
    ExceededSafeAmount {
        /// RUNE value the allocation reached.
        counter: u128,
        /// Half the node's bond.
        cap: u128,
    },

    /// Outbound scheduling failure.
    #[error(transparent)]
    TxOut(#[from] TxOutError),

    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),
}

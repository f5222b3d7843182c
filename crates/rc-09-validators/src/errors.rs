//! # Validator manager errors

use rc_02_keeper::KeeperError;
use rc_05_vaults::VaultError;
use rc_06_txout::TxOutError;
use rc_08_rewards::RewardError;
use thiserror::Error;

/// Validator lifecycle and slashing failures.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),

    /// Vault lifecycle failure.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Outbound scheduling failure.
    #[error(transparent)]
    TxOut(#[from] TxOutError),

    /// Reward payout failure.
    #[error(transparent)]
    Reward(#[from] RewardError),
}

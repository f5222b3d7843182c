//! # Reward engine errors

use rc_02_keeper::KeeperError;
use thiserror::Error;

/// Reward distribution failures.
#[derive(Debug, Error)]
pub enum RewardError {
    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),

    /// Event payload serialization failure.
    #[error("fail to encode reward event: {0}")]
    Codec(String),
}

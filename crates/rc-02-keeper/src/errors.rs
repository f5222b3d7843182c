//! # Keeper errors

use thiserror::Error;

/// Persistence failures. All of them surface as `Internal` results at the
/// handler boundary and abort the containing message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeeperError {
    /// The underlying store rejected the operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored value failed to decode.
    #[error("codec error on {key}: {reason}")]
    Codec {
        /// The key whose value failed to decode.
        key: String,
        /// Decoder failure description.
        reason: String,
    },

    /// A record that must exist was missing.
    #[error("{0} does not exist")]
    NotFound(String),
}

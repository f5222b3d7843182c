//! # Observer errors

use rc_02_keeper::KeeperError;
use thiserror::Error;

/// Observation failures.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// The witness was structurally invalid.
    #[error("invalid observed tx: {0}")]
    Validation(String),

    /// Persistence failure.
    #[error(transparent)]
    Keeper(#[from] KeeperError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ObserverError::Validation("empty tx id".to_string());
        assert!(err.to_string().contains("empty tx id"));
    }
}

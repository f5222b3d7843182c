//! Tx markers correlate internally initiated outbounds with their later
//! observation: the memo is stored against the predicted content hash and
//! reattached when the foreign tx comes back in.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use serde::{Deserialize, Serialize};
use shared_types::TxId;

/// A stored memo awaiting its observation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMarker {
    /// Height the outbound was scheduled.
    pub height: u64,
    /// The memo the signer will attach.
    pub memo: String,
}

impl TxMarker {
    /// Create a marker.
    pub fn new(height: u64, memo: String) -> Self {
        Self { height, memo }
    }
}

impl Keeper {
    fn marker_key(hash: &TxId) -> String {
        format!("{}{}", keys::TX_MARKER, hash)
    }

    /// Append a marker for the content hash.
    pub fn append_tx_marker(&mut self, hash: &TxId, marker: TxMarker) -> Result<(), KeeperError> {
        let mut markers = self.get_tx_markers(hash)?;
        markers.push(marker);
        self.put(&Self::marker_key(hash), &markers)
    }

    /// All markers for the content hash, oldest first.
    pub fn get_tx_markers(&self, hash: &TxId) -> Result<Vec<TxMarker>, KeeperError> {
        Ok(self.fetch(&Self::marker_key(hash))?.unwrap_or_default())
    }

    /// Replace the marker list, dropping the key when empty.
    pub fn set_tx_markers(&mut self, hash: &TxId, markers: &[TxMarker]) -> Result<(), KeeperError> {
        if markers.is_empty() {
            self.remove(&Self::marker_key(hash))
        } else {
            self.put(&Self::marker_key(hash), &markers)
        }
    }
}

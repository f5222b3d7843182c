//! Keygen requests: the member sets nominated for a new asgard key,
//! keyed by the height the churn proposed them.

use super::{keys, pad_height, Keeper};
use crate::errors::KeeperError;
use serde::{Deserialize, Serialize};
use shared_types::PubKey;

/// One nominated member set awaiting TSS completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Keygen {
    /// Height the keygen was requested.
    pub height: u64,
    /// Node pubkeys expected to participate.
    pub members: Vec<PubKey>,
}

impl Keygen {
    /// Create a keygen request with a sorted member set.
    pub fn new(height: u64, mut members: Vec<PubKey>) -> Self {
        members.sort();
        Self { height, members }
    }
}

impl Keeper {
    /// Persist a keygen request.
    pub fn set_keygen(&mut self, keygen: &Keygen) -> Result<(), KeeperError> {
        self.put(&format!("{}{}", keys::KEYGENS, pad_height(keygen.height)), keygen)
    }

    /// Fetch the keygen request proposed at the height, if any.
    pub fn get_keygen(&self, height: u64) -> Result<Option<Keygen>, KeeperError> {
        self.fetch(&format!("{}{}", keys::KEYGENS, pad_height(height)))
    }
}

//! # Queued swap
//!
//! The persisted shape of a swap awaiting execution in the swap queue.
//! Inbound swaps are enqueued rather than executed immediately so that
//! EndBlock can drain them in fee order.

use crate::asset::Asset;
use crate::tx::{Address, Tx};
use serde::{Deserialize, Serialize};

/// A pending swap request, keyed by the inbound tx id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSwap {
    /// The inbound tx carrying the source coin.
    pub tx: Tx,
    /// The asset to swap into.
    pub target_asset: Asset,
    /// Where to send the output; empty means back to the sender.
    pub destination: Address,
    /// Minimum acceptable output; zero disables the check.
    pub trade_target: u128,
}

impl QueuedSwap {
    /// Create a queued swap.
    pub fn new(tx: Tx, target_asset: Asset, destination: Address, trade_target: u128) -> Self {
        Self {
            tx,
            target_asset,
            destination,
            trade_target,
        }
    }
}

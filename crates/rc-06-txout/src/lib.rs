//! # RC-06 TxOut Scheduler
//!
//! Builds the per-block outbound batch: picks the vault that will sign
//! each item (yggdrasil preferred, asgard fallback), deducts the network
//! fee into the reserve, sizes the gas allowance, stamps per-chain
//! sequence numbers, and ties every item back to the observation voter so
//! the loop closes when the outbound is witnessed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod refund;
pub mod store;

pub use errors::TxOutError;
pub use refund::refund_tx;
pub use store::TxOutStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

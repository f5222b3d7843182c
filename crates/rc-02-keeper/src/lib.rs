//! # RC-02 Keeper
//!
//! Typed persistence for the whole state machine: pools, stakers, vaults,
//! node accounts, observation voters, outbound batches, events, fees, gas,
//! and the operator override layer.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ```text
//! rc-02-keeper/
//! ├── ports/           # KvStore abstraction
//! ├── adapters/        # deterministic in-memory store
//! └── keeper/          # typed accessors per key prefix
//! ```
//!
//! The keeper contains key-value semantics only: existence checks,
//! serialization, and the event emissions that must accompany specific
//! writes (pool status changes). Business logic lives in the subsystems
//! that call it.
//!
//! Every iteration over stored collections walks lexicographic key order of
//! the underlying prefix, so replay is deterministic regardless of the host
//! platform. Numeric key segments are zero-padded for that reason.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod errors;
pub mod keeper;
pub mod ports;

pub use adapters::MemoryStore;
pub use errors::KeeperError;
pub use keeper::{keys, pad_height, BanVoter, Keeper, Keygen, TssVoter, TxMarker};
pub use ports::KvStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

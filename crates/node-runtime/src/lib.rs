//! # Node Runtime
//!
//! The deterministic block loop. The host consensus engine drives it:
//!
//! ```text
//! BeginBlock -> DeliverMsg* -> EndBlock
//!                               ├─ slash non-observers / non-signers
//!                               ├─ drain swap queue
//!                               ├─ vault accounting (migration, ygg top-up,
//!                               │  ragnarok)
//!                               ├─ rewards
//!                               └─ validator-set updates
//! ```
//!
//! Each delivered message runs inside a store transaction: a rejected
//! message leaves no partial writes behind. EndBlock stages log and skip
//! their errors except storage failures, which propagate so the host can
//! replay the block.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod genesis;
pub mod node;

pub use genesis::GenesisConfig;
pub use node::RuneNode;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}

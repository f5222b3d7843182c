//! # RC-05 Vault Manager
//!
//! Custody lifecycle for the federation's wallets:
//!
//! - **Asgard rotation**: keygen triggers on membership change, new vault
//!   activation, retirement of the old vault, and fund migration to the
//!   successor.
//! - **Yggdrasil funding**: per-node outbound vaults topped up to half the
//!   node's bond, allocated across pools by depth; recalled when the node
//!   leaves.
//! - **Ragnarok**: staged protocol teardown returning pool funds to
//!   stakers and bond to operators.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod manager;
pub mod ragnarok;
pub mod yggdrasil;

pub use errors::VaultError;
pub use manager::VaultMgr;
pub use ragnarok::{process_ragnarok, ragnarok_bond, ragnarok_pools, recall_ygg_funds};
pub use yggdrasil::{calc_target_ygg_coins, fund_yggdrasils, request_ygg_return};

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

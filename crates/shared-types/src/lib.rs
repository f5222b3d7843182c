//! # Shared Types
//!
//! Core domain types shared by every RuneChain subsystem.
//!
//! ## Clusters
//!
//! - **Chain & Asset**: `Chain`, `Asset`, `Coin`, `Gas`
//! - **Transactions**: `Tx`, `TxId`, `Address`, `PubKey`, `NodeAddress`
//! - **Liquidity**: `Pool`, `PoolStatus`, `Staker`
//! - **Custody**: `Vault`, `VaultType`, `VaultStatus`, `VaultData`
//! - **Validators**: `NodeAccount`, `NodeStatus`, `Version`
//! - **Observation**: `ObservedTx`, `ObservedTxVoter`, `ErrataTxVoter`
//! - **Outbound**: `TxOut`, `TxOutItem`
//! - **Events**: `Event`, `EventStatus` and the typed payloads
//! - **Configuration**: `Constants`
//!
//! All amounts are `u128` in 1e-8 base units (`ONE` = 10^8). Pool math that
//! multiplies three amounts goes through `U256` helpers in [`uint`] so the
//! constant-product formulas cannot overflow.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asset;
pub mod chain;
pub mod coin;
pub mod constants;
pub mod errors;
pub mod event;
pub mod node_account;
pub mod observed_tx;
pub mod pool;
pub mod staker;
pub mod swap;
pub mod tx;
pub mod tx_out;
pub mod uint;
pub mod vault;
pub mod vault_data;

// Re-exports
pub use asset::Asset;
pub use chain::Chain;
pub use coin::{Coin, Coins, Gas};
pub use constants::Constants;
pub use errors::TypeError;
pub use event::{
    Event, EventAdd, EventAdminConfig, EventBond, EventErrata, EventFee, EventGas, EventId,
    EventOutbound, EventPool, EventRefund, EventRewards, EventSlash, EventStake, EventStatus,
    EventSwap, EventUnstake, Fee, PoolAmt, PoolMod,
};
pub use node_account::{NodeAccount, NodeStatus, Version};
pub use node_account::NodePubKeys;
pub use observed_tx::{has_super_majority, ErrataTxVoter, ObservedTx, ObservedTxVoter};
pub use pool::{Pool, PoolStatus};
pub use staker::Staker;
pub use swap::QueuedSwap;
pub use tx::{Address, NodeAddress, PubKey, Tx, TxId};
pub use tx_out::{TxOut, TxOutItem};
pub use uint::{get_share, mul_div, safe_sub, ONE};
pub use vault::{select_by_max_coin, Vault, VaultStatus, VaultType};
pub use vault_data::{ReserveContributor, VaultData};

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

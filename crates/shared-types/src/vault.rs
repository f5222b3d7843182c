//! # Vault
//!
//! A threshold-signature wallet custodying foreign-chain funds. Asgard
//! vaults are pooled across the active node set; Yggdrasil vaults belong to
//! a single bonded node and are sized to half its bond.

use crate::asset::Asset;
use crate::chain::Chain;
use crate::coin::{Coin, Coins};
use crate::tx::PubKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Vault custody model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultType {
    /// Pooled vault secured by the whole active node set.
    Asgard,
    /// Per-node outbound vault.
    Yggdrasil,
}

/// Vault lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultStatus {
    /// Accepts inbound funds and may be selected for outbound.
    Active,
    /// No new inbound; funds being migrated out.
    Retiring,
    /// Drained; kept only for record.
    Inactive,
}

/// A vault record, keyed by its public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Threshold-signature public key.
    pub pub_key: PubKey,
    /// Pooled or per-node.
    pub vault_type: VaultType,
    /// Lifecycle status.
    pub status: VaultStatus,
    /// Block height the vault entered its current status.
    pub status_since: u64,
    /// Chains the vault holds addresses on.
    pub chains: BTreeSet<Chain>,
    /// Funds in custody.
    pub coins: Coins,
    /// Heights of blocks with outbound items still pending against this
    /// vault.
    pub pending_tx_block_heights: Vec<u64>,
}

impl Vault {
    /// Create a vault in the given status.
    pub fn new(vault_type: VaultType, status: VaultStatus, height: u64, pub_key: PubKey) -> Self {
        Self {
            pub_key,
            vault_type,
            status,
            status_since: height,
            chains: BTreeSet::new(),
            coins: Coins::new(),
            pending_tx_block_heights: Vec::new(),
        }
    }

    /// Whether this is an asgard vault.
    pub fn is_asgard(&self) -> bool {
        self.vault_type == VaultType::Asgard
    }

    /// Whether this is a yggdrasil vault.
    pub fn is_yggdrasil(&self) -> bool {
        self.vault_type == VaultType::Yggdrasil
    }

    /// Whether the vault is in the given status.
    pub fn has_status(&self, status: VaultStatus) -> bool {
        self.status == status
    }

    /// Whether the vault holds any funds.
    pub fn has_funds(&self) -> bool {
        !self.coins.is_empty()
    }

    /// Whether the vault holds a non-zero amount of the asset.
    pub fn has_asset(&self, asset: &Asset) -> bool {
        self.coins.has(asset)
    }

    /// Amount of the asset in custody.
    pub fn amount_of(&self, asset: &Asset) -> u128 {
        self.coins.amount_of(asset)
    }

    /// Credit funds into the vault, registering the chain.
    pub fn add_funds(&mut self, coins: &Coins) {
        for coin in coins.iter() {
            self.chains.insert(coin.asset.chain);
            self.coins.add(coin.clone());
        }
    }

    /// Debit funds from the vault, flooring at zero.
    pub fn sub_funds(&mut self, coins: &Coins) {
        for coin in coins.iter() {
            self.coins.sub(coin);
        }
    }

    /// Mark the vault retiring as of the given height.
    pub fn retire(&mut self, height: u64) {
        self.status = VaultStatus::Retiring;
        self.status_since = height;
    }

    /// Mark the vault inactive as of the given height.
    pub fn deactivate(&mut self, height: u64) {
        self.status = VaultStatus::Inactive;
        self.status_since = height;
    }
}

/// Select the vault holding the deepest balance of the asset.
pub fn select_by_max_coin<'a>(vaults: &'a [Vault], asset: &Asset) -> Option<&'a Vault> {
    vaults
        .iter()
        .max_by(|a, b| {
            a.amount_of(asset)
                .cmp(&b.amount_of(asset))
                // deterministic tiebreak on pubkey
                .then_with(|| b.pub_key.cmp(&a.pub_key))
        })
        .filter(|v| v.amount_of(asset) > 0)
}

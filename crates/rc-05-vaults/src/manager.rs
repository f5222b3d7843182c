//! Asgard lifecycle: keygen triggers, rotation, and fund migration.

use crate::errors::VaultError;
use rc_01_memo::Memo;
use rc_02_keeper::{Keeper, Keygen};
use shared_types::{
    safe_sub, Coin, Constants, NodeAccount, PubKey, TxId, TxOutItem, Vault, VaultStatus,
    VaultType,
};
use rc_06_txout::TxOutStore;
use tracing::{info, warn};

/// Drives asgard vault state at EndBlock.
pub struct VaultMgr;

impl VaultMgr {
    /// EndBlock: deactivate drained retiring vaults and migrate funds from
    /// the rest to the active set.
    pub fn end_block(
        keeper: &mut Keeper,
        txout: &TxOutStore,
        constants: &Constants,
        height: u64,
    ) -> Result<(), VaultError> {
        let retiring = keeper.get_asgards_by_status(VaultStatus::Retiring)?;
        let active = keeper.get_asgards_by_status(VaultStatus::Active)?;
        if active.is_empty() {
            // nowhere to move funds
            return Ok(());
        }

        for mut vault in retiring {
            if !vault.has_funds() {
                vault.deactivate(height);
                keeper.set_vault(&vault)?;
                info!(vault = %vault.pub_key, "retiring vault drained, now inactive");
                continue;
            }
            if !vault.pending_tx_block_heights.is_empty() {
                info!(vault = %vault.pub_key, "migration transfers still pending");
                continue;
            }
            let scheduled =
                Self::migrate_vault_funds(keeper, txout, constants, height, &vault, &active)?;
            if scheduled > 0 {
                for _ in 0..scheduled {
                    vault.pending_tx_block_heights.push(height);
                }
                keeper.set_vault(&vault)?;
            }
        }
        Ok(())
    }

    /// Schedule one migration item per (chain, asset) held by the retiring
    /// vault, targeting the active asgard holding the least of that asset.
    /// Gas-asset migrations leave enough behind to pay the miner fees of
    /// the other per-asset sends.
    fn migrate_vault_funds(
        keeper: &mut Keeper,
        txout: &TxOutStore,
        constants: &Constants,
        height: u64,
        vault: &Vault,
        active: &[Vault],
    ) -> Result<usize, VaultError> {
        let mut scheduled = 0;
        let coin_count = vault.coins.len() as u128;
        let coins: Vec<Coin> = vault.coins.iter().cloned().collect();
        for coin in coins {
            if coin.is_empty() {
                continue;
            }
            // target the active asgard with the least of this asset, so
            // migration balances the new set
            let Some(target) = active.iter().min_by(|a, b| {
                a.amount_of(&coin.asset)
                    .cmp(&b.amount_of(&coin.asset))
                    .then_with(|| a.pub_key.cmp(&b.pub_key))
            }) else {
                continue;
            };

            let mut amount = coin.amount;
            if coin.asset.is_gas_asset() {
                amount = safe_sub(amount, constants.pool_refund_gas * coin_count);
            }
            if amount == 0 {
                continue;
            }

            let mut toi = TxOutItem::new(
                coin.asset.chain,
                target.pub_key.address(coin.asset.chain),
                Coin::new(coin.asset.clone(), amount),
                TxId::blank(),
            );
            toi.vault_pub_key = vault.pub_key.clone();
            toi.memo = Memo::Migrate {
                block_height: height,
            }
            .to_string();
            if txout.try_add_tx_out_item(keeper, constants, toi)? {
                scheduled += 1;
            }
        }
        Ok(scheduled)
    }

    /// Record a keygen request naming the member set, for the TSS layer to
    /// pick up. Idempotent per (height, members).
    pub fn trigger_keygen(
        keeper: &mut Keeper,
        height: u64,
        nodes: &[NodeAccount],
    ) -> Result<(), VaultError> {
        let members: Vec<PubKey> = nodes
            .iter()
            .map(|na| na.pub_key_set.node_pub_key.clone())
            .collect();
        let keygen = Keygen::new(height, members);
        if let Some(existing) = keeper.get_keygen(height)? {
            if existing == keygen {
                return Ok(());
            }
        }
        info!(height, members = keygen.members.len(), "keygen requested");
        keeper.set_keygen(&keygen)?;
        Ok(())
    }

    /// Activate a freshly keyed asgard vault and retire the previous
    /// active set.
    pub fn rotate_vault(
        keeper: &mut Keeper,
        height: u64,
        pub_key: PubKey,
    ) -> Result<Vault, VaultError> {
        if keeper.vault_exists(&pub_key)? {
            warn!(vault = %pub_key, "vault already exists, not rotating");
            return Ok(keeper.get_vault(&pub_key)?);
        }
        for mut vault in keeper.get_asgards_by_status(VaultStatus::Active)? {
            vault.retire(height);
            keeper.set_vault(&vault)?;
            info!(vault = %vault.pub_key, "asgard vault retiring");
        }
        let vault = Vault::new(VaultType::Asgard, VaultStatus::Active, height, pub_key);
        keeper.set_vault(&vault)?;
        info!(vault = %vault.pub_key, "asgard vault activated");
        Ok(vault)
    }
}

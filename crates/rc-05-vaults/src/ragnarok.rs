//! Ragnarok: staged protocol teardown.
//!
//! Once triggered, every EndBlock advances the teardown: yggdrasil funds
//! are recalled, every staker is unstaked in full and refunded, pools drop
//! to Bootstrap as they drain, and finally every bond is returned.

use crate::errors::VaultError;
use crate::yggdrasil::request_ygg_return;
use rc_01_memo::Memo;
use rc_02_keeper::Keeper;
use rc_03_amm::unstake;
use shared_types::{Chain, Coin, Constants, NodeStatus, Staker, TxId, TxOutItem};
use rc_06_txout::TxOutStore;
use tracing::{info, warn};

/// Advance the teardown by one block, if it has been triggered.
pub fn process_ragnarok(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    constants: &Constants,
    height: u64,
) -> Result<(), VaultError> {
    if keeper.get_ragnarok_height()?.is_none() {
        return Ok(());
    }
    recall_ygg_funds(keeper, txout, height)?;
    let drained = ragnarok_pools(keeper, txout, constants, height)?;
    if drained {
        ragnarok_bond(keeper, txout, height)?;
    }
    Ok(())
}

/// Demand every yggdrasil vault back to asgard.
pub fn recall_ygg_funds(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    height: u64,
) -> Result<(), VaultError> {
    let nodes = keeper.list_node_accounts()?;
    for na in nodes {
        if na.status == NodeStatus::Disabled {
            continue;
        }
        request_ygg_return(keeper, txout, height, &na)?;
    }
    Ok(())
}

/// Unstake every staker of every pool at 10000 basis points and refund
/// them. Returns true once every pool is empty.
pub fn ragnarok_pools(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    constants: &Constants,
    height: u64,
) -> Result<bool, VaultError> {
    let mut all_drained = true;
    for pool in keeper.get_pools()? {
        let stakers = keeper.get_stakers(&pool.asset)?;
        for staker in stakers {
            if staker.units == 0 && staker.pending_rune == 0 {
                continue;
            }
            // lockups don't apply during teardown
            let result = match unstake(
                keeper,
                height,
                &staker.rune_address,
                &pool.asset,
                10_000,
                constants.transaction_fee,
                0,
            ) {
                Ok(result) => result,
                Err(e) => {
                    warn!(pool = %pool.asset, staker = %staker.rune_address, error = %e,
                        "fail to unstake during ragnarok");
                    continue;
                }
            };
            schedule_refunds(keeper, txout, constants, height, &staker, result.rune_amount, result.asset_amount)?;
        }
        if !keeper.get_pool(&pool.asset)?.is_empty() {
            all_drained = false;
        }
    }
    Ok(all_drained)
}

fn schedule_refunds(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    constants: &Constants,
    height: u64,
    staker: &Staker,
    rune_amount: u128,
    asset_amount: u128,
) -> Result<(), VaultError> {
    let memo = Memo::Ragnarok {
        block_height: height,
    }
    .to_string();
    if rune_amount > 0 {
        let mut toi = TxOutItem::new(
            Chain::Rune,
            staker.rune_address.clone(),
            Coin::rune(rune_amount),
            TxId::blank(),
        );
        toi.memo = memo.clone();
        txout.try_add_tx_out_item(keeper, constants, toi)?;
    }
    if asset_amount > 0 {
        let to = if staker.asset_address.is_empty() {
            staker.rune_address.clone()
        } else {
            staker.asset_address.clone()
        };
        let mut toi = TxOutItem::new(
            staker.asset.chain,
            to,
            Coin::new(staker.asset.clone(), asset_amount),
            TxId::blank(),
        );
        toi.memo = memo;
        txout.try_add_tx_out_item(keeper, constants, toi)?;
    }
    Ok(())
}

/// Refund every remaining bond. Runs once the pools are dry.
pub fn ragnarok_bond(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    height: u64,
) -> Result<(), VaultError> {
    for mut na in keeper.list_node_accounts()? {
        if na.bond == 0 || na.status == NodeStatus::Disabled {
            continue;
        }
        // bond stays escrowed while yggdrasil funds are outstanding
        let ygg = keeper.get_yggdrasil(&na.pub_key_set.node_pub_key, height)?;
        if ygg.has_funds() {
            continue;
        }
        let mut toi = TxOutItem::new(
            Chain::Rune,
            na.bond_address.clone(),
            Coin::rune(na.bond),
            TxId::blank(),
        );
        toi.memo = Memo::Ragnarok {
            block_height: height,
        }
        .to_string();
        txout.unsafe_add_tx_out_item(keeper, toi)?;
        info!(node = %na.node_address, bond = na.bond, "bond refunded");
        na.bond = 0;
        keeper.set_node_account(&na)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_02_keeper::MemoryStore;
    use rc_03_amm::{stake, StakeInputs};
    use shared_types::{
        Address, Asset, NodeAccount, NodeAddress, NodePubKeys, PoolStatus, PubKey, Vault,
        VaultStatus, VaultType, ONE,
    };

    fn keeper() -> Keeper {
        Keeper::new(Box::new(MemoryStore::new()))
    }

    fn bnb() -> Asset {
        Asset::new(Chain::Bnb, "BNB")
    }

    fn store_at(height: u64) -> TxOutStore {
        let mut store = TxOutStore::new();
        store.new_block(height);
        store
    }

    fn seed_asgard(keeper: &mut Keeper) {
        let mut vault = Vault::new(
            VaultType::Asgard,
            VaultStatus::Active,
            1,
            PubKey::new("asgard-pk"),
        );
        vault.add_funds(
            &vec![
                Coin::rune(10_000 * ONE),
                Coin::new(bnb(), 10_000 * ONE),
            ]
            .into(),
        );
        keeper.set_vault(&vault).unwrap();
    }

    #[test]
    fn test_ragnarok_refunds_stakers_and_bootstraps_pool() {
        let mut keeper = keeper();
        seed_asgard(&mut keeper);
        stake(
            &mut keeper,
            1,
            StakeInputs {
                asset: bnb(),
                rune_amount: 100 * ONE,
                asset_amount: 100 * ONE,
                rune_address: Address::new("rune1staker"),
                asset_address: Address::none(),
                tx_id: TxId::from_hash(b"stake"),
            },
        )
        .unwrap();
        keeper.set_ragnarok_height(10).unwrap();

        let store = store_at(10);
        process_ragnarok(&mut keeper, &store, &Constants::default(), 10).unwrap();

        let pool = keeper.get_pool(&bnb()).unwrap();
        assert!(pool.is_empty());
        assert_eq!(pool.status, PoolStatus::Bootstrap);
        let items = store.get_outbound_items(&keeper).unwrap();
        // one RUNE refund, one asset refund
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.memo == "RAGNAROK:10"));
    }

    #[test]
    fn test_bond_refund_waits_for_ygg_return() {
        let mut keeper = keeper();
        seed_asgard(&mut keeper);
        keeper.set_ragnarok_height(10).unwrap();

        let na = NodeAccount::new(
            NodeAddress::new("rune1node0"),
            shared_types::NodeStatus::Standby,
            NodePubKeys {
                node_pub_key: PubKey::new("node-pk-0"),
                validator_cons_pub_key: PubKey::new("cons-pk-0"),
            },
            200 * ONE,
            Address::new("rune1bondaddr"),
            1,
        );
        keeper.set_node_account(&na).unwrap();

        // yggdrasil still holds funds: bond stays escrowed
        let mut ygg = Vault::new(
            VaultType::Yggdrasil,
            VaultStatus::Active,
            1,
            PubKey::new("node-pk-0"),
        );
        ygg.add_funds(&vec![Coin::new(bnb(), ONE)].into());
        keeper.set_vault(&ygg).unwrap();

        let store = store_at(11);
        process_ragnarok(&mut keeper, &store, &Constants::default(), 11).unwrap();
        assert_eq!(
            keeper
                .get_node_account(&NodeAddress::new("rune1node0"))
                .unwrap()
                .bond,
            200 * ONE
        );

        // funds returned: bond refund goes out
        ygg.sub_funds(&vec![Coin::new(bnb(), ONE)].into());
        keeper.set_vault(&ygg).unwrap();
        let store = store_at(12);
        process_ragnarok(&mut keeper, &store, &Constants::default(), 12).unwrap();
        assert_eq!(
            keeper
                .get_node_account(&NodeAddress::new("rune1node0"))
                .unwrap()
                .bond,
            0
        );
        let items = store.get_outbound_items(&keeper).unwrap();
        assert!(items
            .iter()
            .any(|i| i.coin.is_rune() && i.coin.amount == 200 * ONE));
    }
}

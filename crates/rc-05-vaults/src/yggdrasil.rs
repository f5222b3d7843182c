//! Yggdrasil vault funding and recall.

use crate::errors::VaultError;
use rc_01_memo::Memo;
use rc_02_keeper::Keeper;
use shared_types::{
    get_share, safe_sub, select_by_max_coin, Asset, Coin, Coins, Constants, NodeAccount, Pool,
    TxId, TxOutItem, Vault, VaultStatus,
};
use rc_06_txout::TxOutStore;
use tracing::{debug, info};

/// Ideal holdings for a yggdrasil vault: half the node's bond in RUNE
/// value, allocated across all pools in proportion to their RUNE depth and
/// split half-RUNE / half-asset per pool. Returns the coins still missing
/// versus that target.
pub fn calc_target_ygg_coins(
    pools: &[Pool],
    ygg: &Vault,
    ygg_bond: u128,
    total_bond: u128,
) -> Result<Coins, VaultError> {
    let total_rune: u128 = pools.iter().map(|p| p.balance_rune).sum();
    let total_units: u128 = pools.iter().map(|p| p.pool_units).sum();
    if total_rune == 0 || total_units == 0 {
        // nothing staked, nothing to delegate
        return Ok(Coins::new());
    }

    // target value: half the bond, bounded by this node's proportional
    // share of all pooled RUNE
    let mut target_value = get_share(ygg_bond, total_bond, total_rune);
    if target_value > ygg_bond / 2 {
        target_value = ygg_bond / 2;
    }

    // RUNE value associated with the vault so far; the cap guard below
    // keeps a bad allocation from ever exceeding half the bond
    let mut counter = 0u128;
    let mut coins = Coins::new();
    let mut rune_amount = 0u128;
    for pool in pools {
        if pool.pool_units == 0 {
            continue;
        }
        // the pool's slice of the target, split half RUNE, half asset;
        // 1% of the asset side carries the same RUNE value as 1% of the
        // RUNE side of the same pool
        let slice = get_share(pool.pool_units, total_units, target_value);
        let rune_half = slice / 2;
        let asset_half = pool.rune_value_in_asset(slice - rune_half);
        rune_amount += rune_half;
        let missing = safe_sub(asset_half, ygg.amount_of(&pool.asset));
        if missing > 0 {
            counter += slice - rune_half;
            coins.add(Coin::new(pool.asset.clone(), missing));
        }
    }

    let missing_rune = safe_sub(rune_amount, ygg.amount_of(&Asset::rune()));
    if missing_rune > 0 {
        counter += missing_rune;
        coins.add(Coin::rune(missing_rune));
    }

    if counter > ygg_bond / 2 {
        return Err(VaultError::ExceededSafeAmount {
            counter,
            cap: ygg_bond / 2,
        });
    }
    Ok(coins)
}

/// Top up the yggdrasil vault of one active node per block (round-robin),
/// when its holdings dropped under a quarter of its bond.
pub fn fund_yggdrasils(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    constants: &Constants,
    height: u64,
) -> Result<(), VaultError> {
    // no funding during teardown or while a migration is draining vaults
    if keeper.get_ragnarok_height()?.is_some() {
        return Ok(());
    }
    if !keeper.get_asgards_by_status(VaultStatus::Retiring)?.is_empty() {
        return Ok(());
    }

    let actives = keeper.list_active_node_accounts()?;
    if actives.len() <= constants.minimum_nodes_for_yggdrasil {
        return Ok(());
    }
    let total_bond: u128 = actives.iter().map(|na| na.bond).sum();
    let pools = keeper.get_pools()?;

    // one vault per block keeps the outbound batch small
    let na = &actives[(height as usize) % actives.len()];
    fund_one(keeper, txout, height, na, &pools, total_bond)
}

fn fund_one(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    height: u64,
    na: &NodeAccount,
    pools: &[Pool],
    total_bond: u128,
) -> Result<(), VaultError> {
    let mut ygg = keeper.get_yggdrasil(&na.pub_key_set.node_pub_key, height)?;
    if !ygg.is_yggdrasil() {
        return Ok(());
    }
    // don't layer transfers on top of ones still in flight
    if !ygg.pending_tx_block_heights.is_empty() {
        debug!(node = %na.node_address, "yggdrasil transfers still pending");
        return Ok(());
    }
    keeper.set_vault(&ygg)?;

    // current vault value in RUNE
    let mut total_value = 0u128;
    for coin in ygg.coins.iter() {
        if coin.is_rune() {
            total_value += coin.amount;
            continue;
        }
        if let Some(pool) = pools.iter().find(|p| p.asset == coin.asset) {
            total_value += pool.asset_value_in_rune(coin.amount);
        }
    }
    // above a quarter of the bond the vault is funded well enough
    if total_value * 4 >= na.bond {
        debug!(node = %na.node_address, total_value, "yggdrasil well funded");
        return Ok(());
    }

    let targets = calc_target_ygg_coins(pools, &ygg, na.bond, total_bond)?;
    let mut send_coins = Coins::new();
    for target in targets.iter() {
        let held = ygg.amount_of(&target.asset);
        // refill anything under half its ideal holding
        if held < target.amount / 2 {
            send_coins.add(Coin::new(target.asset.clone(), safe_sub(target.amount, held)));
        }
    }

    if send_coins.is_empty() {
        return Ok(());
    }
    info!(node = %na.node_address, coins = send_coins.len(), "funding yggdrasil");
    let sent = send_coins_to_yggdrasil(keeper, txout, height, &ygg, send_coins)?;
    for _ in 0..sent {
        ygg.pending_tx_block_heights.push(height);
    }
    keeper.set_vault(&ygg)?;
    Ok(())
}

fn send_coins_to_yggdrasil(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    height: u64,
    ygg: &Vault,
    coins: Coins,
) -> Result<usize, VaultError> {
    let mut count = 0;
    let active = keeper.get_asgards_by_status(VaultStatus::Active)?;
    for coin in coins.iter() {
        let Some(vault) = select_by_max_coin(&active, &coin.asset) else {
            continue;
        };
        if coin.amount > vault.amount_of(&coin.asset) {
            // not enough funds
            continue;
        }
        let mut toi = TxOutItem::new(
            coin.asset.chain,
            ygg.pub_key.address(coin.asset.chain),
            coin.clone(),
            TxId::blank(),
        );
        toi.vault_pub_key = vault.pub_key.clone();
        toi.memo = Memo::YggdrasilFund {
            block_height: height,
        }
        .to_string();
        txout.unsafe_add_tx_out_item(keeper, toi)?;
        count += 1;
    }
    Ok(count)
}

/// Demand the node's yggdrasil funds back to asgard. Until they arrive the
/// node's bond stays escrowed.
pub fn request_ygg_return(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    height: u64,
    na: &NodeAccount,
) -> Result<(), VaultError> {
    let ygg = keeper.get_yggdrasil(&na.pub_key_set.node_pub_key, height)?;
    if !ygg.is_yggdrasil() || !ygg.has_funds() {
        return Ok(());
    }
    let active = keeper.get_asgards_by_status(VaultStatus::Active)?;
    let Some(target) = active.first() else {
        return Ok(());
    };

    // one recall per chain; the signer drains the account, so the item
    // carries an empty coin
    for chain in ygg.chains.iter() {
        let mut toi = TxOutItem::new(
            *chain,
            target.pub_key.address(*chain),
            Coin::new(chain.gas_asset(), 0),
            TxId::blank(),
        );
        toi.vault_pub_key = ygg.pub_key.clone();
        toi.memo = Memo::YggdrasilReturn {
            block_height: height,
        }
        .to_string();
        txout.unsafe_add_tx_out_item(keeper, toi)?;
    }
    info!(node = %na.node_address, "yggdrasil return requested");
    Ok(())
}

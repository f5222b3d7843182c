//! Reward computation and distribution.

use crate::errors::RewardError;
use rc_02_keeper::Keeper;
use shared_types::{
    get_share, mul_div, safe_sub, Constants, Event, EventGas, EventRewards, EventStatus,
    NodeAccount, Pool, PoolAmt, Tx, TxId,
};
use tracing::{debug, info};

/// The RUNE emitted from the reserve this block.
pub fn calc_block_reward(reserve: u128, emission_curve: u128, blocks_per_year: u128) -> u128 {
    if emission_curve == 0 || blocks_per_year == 0 {
        return 0;
    }
    reserve / emission_curve / blocks_per_year
}

/// The staker's slice of system income on the incentive curve: zero when
/// staked RUNE matches or exceeds bonded RUNE, one third at the 1:2
/// equilibrium, everything when nothing is bonded.
pub fn calc_staker_share(system_income: u128, total_staked: u128, total_bonded: u128) -> u128 {
    if total_staked >= total_bonded {
        return 0;
    }
    mul_div(
        system_income,
        total_bonded - total_staked,
        total_bonded + total_staked,
    )
}

/// EndBlock: split this block's income, grow the bond-reward accumulator,
/// reimburse gas, and credit or debit pools.
pub fn update_vault_data(
    keeper: &mut Keeper,
    constants: &Constants,
    height: u64,
) -> Result<(), RewardError> {
    let mut vault = keeper.get_vault_data()?;
    if vault.total_reserve == 0 {
        // nothing to emit
        return Ok(());
    }

    let mut pools: Vec<Pool> = keeper
        .get_pools()?
        .into_iter()
        .filter(|p| p.is_enabled() && p.balance_rune > 0)
        .collect();
    let total_staked: u128 = pools.iter().map(|p| p.balance_rune).sum();
    if total_staked == 0 {
        // no stakers, no rewards
        return Ok(());
    }

    let total_fees = keeper.get_total_liquidity_fees(height)?;
    let total_bonded = keeper.total_active_bond()?;

    let block_reward = calc_block_reward(
        vault.total_reserve,
        constants.emission_curve,
        constants.blocks_per_year,
    );
    let system_income = block_reward + total_fees;
    let staker_share = calc_staker_share(system_income, total_staked, total_bonded);
    let bonder_share = safe_sub(system_income, staker_share);

    vault.total_reserve = safe_sub(vault.total_reserve, block_reward);
    vault.bond_reward_rune += bonder_share;

    let mut event_pools: Vec<PoolAmt> = Vec::new();

    if staker_share >= total_fees {
        // pools already hold the fees; only the excess moves from the
        // reserve into pool depths
        let mut pool_reward = staker_share - total_fees;

        // gas consumed on behalf of the pools comes out of their reward
        for gas_coin in vault.gas.clone().iter() {
            if gas_coin.is_empty() {
                continue;
            }
            let Some(pool) = pools.iter_mut().find(|p| p.asset == gas_coin.asset) else {
                continue;
            };
            let rune_gas = pool.asset_value_in_rune(gas_coin.amount);
            pool.balance_rune += rune_gas;
            pool_reward = safe_sub(pool_reward, rune_gas);
            debug!(pool = %gas_coin.asset, rune_gas, "gas reimbursed");

            let payload = serde_json::to_value(EventGas {
                asset: gas_coin.asset.clone(),
                asset_amt: gas_coin.amount,
                rune_amt: rune_gas,
                transaction_count: 1,
            })
            .map_err(|e| RewardError::Codec(e.to_string()))?;
            let mut in_tx = Tx::default();
            in_tx.id = TxId::blank();
            keeper.set_completed_event(Event::new(
                EventGas::TYPE,
                height,
                in_tx,
                payload,
                EventStatus::Success,
            ))?;
        }
        vault.gas = shared_types::Gas::default();

        // distribute by RUNE depth
        let rewards: Vec<u128> = pools
            .iter()
            .map(|p| get_share(p.balance_rune, total_staked, pool_reward))
            .collect();
        for (pool, reward) in pools.iter_mut().zip(rewards) {
            pool.balance_rune += reward;
            keeper.set_pool(height, pool)?;
            event_pools.push(PoolAmt {
                asset: pool.asset.clone(),
                amount: reward as i128,
            });
        }
    } else {
        // stakers earned more in fees than their share; claw the
        // difference back from each pool weighted by the fees it earned
        let staker_deficit = total_fees - staker_share;
        for pool in pools.iter_mut() {
            let pool_fees = keeper.get_pool_liquidity_fees(height, &pool.asset)?;
            if pool_fees == 0 {
                continue;
            }
            let deficit = get_share(pool_fees, total_fees, staker_deficit);
            pool.balance_rune = safe_sub(pool.balance_rune, deficit);
            keeper.set_pool(height, pool)?;
            event_pools.push(PoolAmt {
                asset: pool.asset.clone(),
                amount: -(deficit as i128),
            });
        }
    }

    // one bond unit per active node per block
    let actives = keeper.total_active_node_accounts()?;
    vault.total_bond_units += actives as u128;
    keeper.set_vault_data(&vault)?;

    info!(
        block_reward, system_income, staker_share, bonder_share,
        "block rewards distributed"
    );

    let payload = serde_json::to_value(EventRewards {
        bond_reward: bonder_share,
        pool_rewards: event_pools,
    })
    .map_err(|e| RewardError::Codec(e.to_string()))?;
    let mut in_tx = Tx::default();
    in_tx.id = TxId::blank();
    keeper.set_completed_event(Event::new(
        EventRewards::TYPE,
        height,
        in_tx,
        payload,
        EventStatus::Success,
    ))?;
    Ok(())
}

/// Pay a node its share of the bond-reward accumulator when it leaves the
/// active set: one unit per block served, bounded by what the accumulator
/// still holds.
pub fn pay_node_bond_award(
    keeper: &mut Keeper,
    na: &mut NodeAccount,
    height: u64,
) -> Result<u128, RewardError> {
    let mut vault = keeper.get_vault_data()?;
    if vault.total_bond_units == 0 || na.active_block_height == 0 {
        return Ok(0);
    }
    let blocks_served = safe_sub(height as u128, na.active_block_height as u128);
    if blocks_served == 0 {
        return Ok(0);
    }
    let mut reward = get_share(blocks_served, vault.total_bond_units, vault.bond_reward_rune);
    reward = reward.min(vault.bond_reward_rune);

    na.bond += reward;
    vault.bond_reward_rune = safe_sub(vault.bond_reward_rune, reward);
    vault.total_bond_units = safe_sub(vault.total_bond_units, blocks_served);
    keeper.set_vault_data(&vault)?;
    keeper.set_node_account(na)?;
    info!(node = %na.node_address, reward, blocks_served, "bond award paid");
    Ok(reward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_02_keeper::MemoryStore;
    use shared_types::{
        Address, Asset, Chain, Coin, NodeAddress, NodePubKeys, NodeStatus, VaultData, ONE,
    };

    fn keeper() -> Keeper {
        Keeper::new(Box::new(MemoryStore::new()))
    }

    fn bnb() -> Asset {
        Asset::new(Chain::Bnb, "BNB")
    }

    fn seed_pool(keeper: &mut Keeper, asset: Asset, rune: u128) {
        let mut pool = Pool::new(asset);
        pool.balance_rune = rune;
        pool.balance_asset = rune;
        pool.pool_units = rune;
        keeper.set_pool(1, &pool).unwrap();
    }

    fn seed_nodes(keeper: &mut Keeper, bonds: &[u128]) {
        for (i, bond) in bonds.iter().enumerate() {
            let na = NodeAccount::new(
                NodeAddress::new(&format!("rune1node{i}")),
                NodeStatus::Active,
                NodePubKeys::default(),
                *bond,
                Address::new("rune1bond"),
                1,
            );
            keeper.set_node_account(&na).unwrap();
        }
    }

    #[test]
    fn test_block_reward_formula() {
        // reserve/(6*6311390), integer division
        assert_eq!(
            calc_block_reward(100 * ONE, 6, 6_311_390),
            100 * ONE / 6 / 6_311_390
        );
        assert_eq!(calc_block_reward(0, 6, 6_311_390), 0);
    }

    #[test]
    fn test_staker_share_curve() {
        // staked 1000, bonded 2000: share = income/3
        assert_eq!(calc_staker_share(300, 1_000, 2_000), 100);
        // staked == bonded: nothing for stakers
        assert_eq!(calc_staker_share(300, 2_000, 2_000), 0);
        // overstaked: still nothing
        assert_eq!(calc_staker_share(300, 3_000, 2_000), 0);
        // nothing bonded at all
        assert_eq!(calc_staker_share(300, 1_000, 0), 0);
    }

    #[test]
    fn test_reward_split_expected_numbers() {
        let mut keeper = keeper();
        seed_pool(&mut keeper, bnb(), 1_000 * ONE);
        seed_nodes(&mut keeper, &[1_000 * ONE, 1_000 * ONE]);
        let mut vault = VaultData::new();
        vault.total_reserve = 100 * ONE;
        keeper.set_vault_data(&vault).unwrap();

        update_vault_data(&mut keeper, &Constants::default(), 5).unwrap();

        let block_reward = 100 * ONE / 6 / 6_311_390;
        let staker_share = block_reward / 3;
        let bonder_share = block_reward - staker_share;

        let after = keeper.get_vault_data().unwrap();
        assert_eq!(after.total_reserve, 100 * ONE - block_reward);
        assert_eq!(after.bond_reward_rune, bonder_share);
        assert_eq!(after.total_bond_units, 2);
        let pool = keeper.get_pool(&bnb()).unwrap();
        assert_eq!(pool.balance_rune, 1_000 * ONE + staker_share);
    }

    #[test]
    fn test_pool_rewards_weighted_by_depth() {
        let mut keeper = keeper();
        seed_pool(&mut keeper, bnb(), 300 * ONE);
        seed_pool(&mut keeper, Asset::new(Chain::Btc, "BTC"), 100 * ONE);
        seed_nodes(&mut keeper, &[10_000 * ONE]);
        let mut vault = VaultData::new();
        vault.total_reserve = 1_000_000 * ONE;
        keeper.set_vault_data(&vault).unwrap();

        update_vault_data(&mut keeper, &Constants::default(), 5).unwrap();

        let bnb_gain = keeper.get_pool(&bnb()).unwrap().balance_rune - 300 * ONE;
        let btc_gain =
            keeper.get_pool(&Asset::new(Chain::Btc, "BTC")).unwrap().balance_rune - 100 * ONE;
        // 3x the depth earns ~3x the reward
        assert!(bnb_gain >= btc_gain * 3 - 3 && bnb_gain <= btc_gain * 3 + 3);
    }

    #[test]
    fn test_deficit_clawed_back_from_fee_pools() {
        let mut keeper = keeper();
        seed_pool(&mut keeper, bnb(), 1_000 * ONE);
        // staked exceeds bonded: staker share is zero, fees claw back
        seed_nodes(&mut keeper, &[100 * ONE]);
        keeper.add_to_liquidity_fees(5, &bnb(), 10 * ONE).unwrap();
        let mut vault = VaultData::new();
        vault.total_reserve = 100 * ONE;
        keeper.set_vault_data(&vault).unwrap();

        update_vault_data(&mut keeper, &Constants::default(), 5).unwrap();
        let pool = keeper.get_pool(&bnb()).unwrap();
        assert_eq!(pool.balance_rune, 990 * ONE);
        // everything went to bonders
        let after = keeper.get_vault_data().unwrap();
        let block_reward = 100 * ONE / 6 / 6_311_390;
        assert_eq!(after.bond_reward_rune, block_reward + 10 * ONE);
    }

    #[test]
    fn test_gas_reimbursement_credits_pool() {
        let mut keeper = keeper();
        seed_pool(&mut keeper, bnb(), 1_000 * ONE);
        seed_nodes(&mut keeper, &[10_000 * ONE]);
        let mut vault = VaultData::new();
        vault.total_reserve = 1_000_000 * ONE;
        vault.gas.add(Coin::new(bnb(), ONE));
        keeper.set_vault_data(&vault).unwrap();

        update_vault_data(&mut keeper, &Constants::default(), 5).unwrap();
        // 1 BNB of gas at 1:1 returned the pool 1 RUNE (plus its reward)
        let pool = keeper.get_pool(&bnb()).unwrap();
        assert!(pool.balance_rune > 1_001 * ONE);
        assert!(keeper.get_vault_data().unwrap().gas.is_empty());
    }

    #[test]
    fn test_bond_award_payout() {
        let mut keeper = keeper();
        let mut vault = VaultData::new();
        vault.bond_reward_rune = 100 * ONE;
        vault.total_bond_units = 200;
        keeper.set_vault_data(&vault).unwrap();

        let mut na = NodeAccount::new(
            NodeAddress::new("rune1leaver"),
            NodeStatus::Active,
            NodePubKeys::default(),
            1_000 * ONE,
            Address::new("rune1bond"),
            1,
        );
        na.active_block_height = 100;
        let reward = pay_node_bond_award(&mut keeper, &mut na, 150).unwrap();

        // 50 blocks of 200 units: a quarter of the accumulator
        assert_eq!(reward, 25 * ONE);
        assert_eq!(na.bond, 1_025 * ONE);
        let after = keeper.get_vault_data().unwrap();
        assert_eq!(after.bond_reward_rune, 75 * ONE);
        assert_eq!(after.total_bond_units, 150);
    }
}

//! Unstake execution.

use crate::errors::UnstakeError;
use rc_02_keeper::Keeper;
use shared_types::{get_share, safe_sub, Address, Asset, PoolStatus};
use tracing::{debug, info};

const MAX_BASIS_POINTS: u64 = 10_000;

/// What an unstake pays out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnstakeResult {
    /// RUNE returned to the staker (incl. released pending RUNE).
    pub rune_amount: u128,
    /// Asset returned to the staker.
    pub asset_amount: u128,
    /// Units burned.
    pub units_burned: u128,
    /// Asset retained in the vault to pay the outbound miner fee.
    pub gas_retained: u128,
}

/// Share math for a withdrawal. Returns
/// `(withdraw_rune, withdraw_asset, units_after)`.
pub fn calculate_unstake(
    pool_units: u128,
    pool_rune: u128,
    pool_asset: u128,
    staker_units: u128,
    basis_points: u64,
) -> Result<(u128, u128, u128), UnstakeError> {
    if pool_units == 0 {
        return Err(UnstakeError::Validation("pool units can't be zero".to_string()));
    }
    if pool_rune == 0 {
        return Err(UnstakeError::Validation(
            "pool rune balance can't be zero".to_string(),
        ));
    }
    if pool_asset == 0 {
        return Err(UnstakeError::Validation(
            "pool asset balance can't be zero".to_string(),
        ));
    }
    if staker_units == 0 {
        return Err(UnstakeError::Validation("staker unit can't be zero".to_string()));
    }
    if basis_points == 0 || basis_points > MAX_BASIS_POINTS {
        return Err(UnstakeError::Validation(format!(
            "withdraw basis points {basis_points} is invalid"
        )));
    }

    let units_to_claim = get_share(basis_points as u128, MAX_BASIS_POINTS as u128, staker_units);
    let withdraw_rune = get_share(units_to_claim, pool_units, pool_rune);
    let withdraw_asset = get_share(units_to_claim, pool_units, pool_asset);
    let units_after = safe_sub(staker_units, units_to_claim);
    Ok((withdraw_rune, withdraw_asset, units_after))
}

/// Withdraw a fraction of a staker's position. Mutates the pool and the
/// staker record; the pool drops to Bootstrap when either side empties.
pub fn unstake(
    keeper: &mut Keeper,
    height: u64,
    rune_address: &Address,
    asset: &Asset,
    basis_points: u64,
    transaction_fee: u128,
    stake_lock_up_blocks: u64,
) -> Result<UnstakeResult, UnstakeError> {
    if rune_address.is_empty() {
        return Err(UnstakeError::Validation("empty rune address".to_string()));
    }
    if asset.is_empty() {
        return Err(UnstakeError::Validation("empty asset".to_string()));
    }
    if basis_points == 0 || basis_points > MAX_BASIS_POINTS {
        return Err(UnstakeError::Validation(format!(
            "withdraw basis points {basis_points} is invalid"
        )));
    }
    if !keeper.pool_exist(asset)? {
        return Err(UnstakeError::Validation(format!(
            "pool-{asset} doesn't exist"
        )));
    }

    let mut pool = keeper.get_pool(asset)?;
    if pool.status == PoolStatus::Suspended {
        return Err(UnstakeError::PoolSuspended(asset.to_string()));
    }

    if !keeper
        .get_stakers(asset)?
        .iter()
        .any(|s| &s.rune_address == rune_address)
    {
        return Err(UnstakeError::StakerNotExist);
    }
    let mut staker = keeper.get_staker(asset, rune_address)?;
    if staker.units == 0 {
        return Err(UnstakeError::NoStakeUnitLeft);
    }

    // slow chains need two txs per stake, so withdrawal is rate limited to
    // keep observation honest
    if !asset.chain.hosts_rune() && height < staker.last_stake_height + stake_lock_up_blocks {
        return Err(UnstakeError::WithinLockup(stake_lock_up_blocks));
    }

    debug!(
        pool = %asset, units = staker.units, basis_points,
        "unstaking"
    );

    let (mut withdraw_rune, mut withdraw_asset, units_after) = calculate_unstake(
        pool.pool_units,
        pool.balance_rune,
        pool.balance_asset,
        staker.units,
        basis_points,
    )?;

    // when the last staker drains the pool, retain enough asset to pay
    // the miner fee of the outbound that returns the funds
    let mut gas_retained = 0;
    if safe_sub(pool.pool_units, staker.units) + units_after == 0 {
        if pool.asset.chain.supports_multi_send() && pool.asset.is_gas_asset() {
            let gas = keeper.get_gas(&pool.asset)?;
            let original = withdraw_asset;
            withdraw_asset = safe_sub(withdraw_asset, gas * 2);
            gas_retained = original - withdraw_asset;
        } else if pool.asset.is_gas_asset() {
            gas_retained = pool.rune_value_in_asset(transaction_fee / 2);
            withdraw_asset = safe_sub(withdraw_asset, gas_retained);
        }
    }

    let units_burned = safe_sub(staker.units, units_after);
    pool.pool_units = safe_sub(pool.pool_units, units_burned);
    pool.balance_rune = safe_sub(pool.balance_rune, withdraw_rune);

    // release any parked one-sided RUNE with the withdrawal; it never
    // entered the pool, so it only grows the payout
    withdraw_rune += staker.pending_rune;
    staker.pending_rune = 0;
    // retained gas stays behind in the pool for the outbound miner fee
    pool.balance_asset = safe_sub(pool.balance_asset, withdraw_asset);

    info!(
        pool = %asset, rune = withdraw_rune, asset_out = withdraw_asset,
        units_left = units_after, "client withdraw"
    );

    if pool.balance_rune == 0 || pool.balance_asset == 0 {
        pool.status = PoolStatus::Bootstrap;
    }
    keeper.set_pool(height, &pool)?;

    staker.units = units_after;
    staker.last_unstake_height = height;
    if staker.is_empty() {
        keeper.remove_staker(&staker)?;
    } else {
        keeper.set_staker(&staker)?;
    }

    Ok(UnstakeResult {
        rune_amount: withdraw_rune,
        asset_amount: withdraw_asset,
        units_burned,
        gas_retained,
    })
}

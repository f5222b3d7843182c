//! Stake execution.

use crate::errors::StakeError;
use rc_02_keeper::Keeper;
use shared_types::{Address, Asset, PoolStatus, TxId, U256};
use tracing::{debug, info};

/// The inputs of one stake deposit.
#[derive(Clone, Debug)]
pub struct StakeInputs {
    /// The pool asset.
    pub asset: Asset,
    /// RUNE side of the deposit.
    pub rune_amount: u128,
    /// Asset side of the deposit.
    pub asset_amount: u128,
    /// The staker's native address (position identity).
    pub rune_address: Address,
    /// The staker's address on the asset chain.
    pub asset_address: Address,
    /// The inbound tx hash.
    pub tx_id: TxId,
}

/// Pool-unit math: `((R+A) * (r*A + R*a)) / (4*R*A)` on the post-add
/// balances. Returns `(new_pool_units, staker_units)`.
pub fn calculate_pool_units(
    old_pool_units: u128,
    pool_rune: u128,
    pool_asset: u128,
    stake_rune: u128,
    stake_asset: u128,
) -> Result<(u128, u128), StakeError> {
    if stake_rune + pool_rune == 0 {
        return Err(StakeError::InvalidPoolUnits(
            "total RUNE in the pool is zero".to_string(),
        ));
    }
    if stake_asset + pool_asset == 0 {
        return Err(StakeError::InvalidPoolUnits(
            "total asset in the pool is zero".to_string(),
        ));
    }
    let rune_after = U256::from(pool_rune) + U256::from(stake_rune);
    let asset_after = U256::from(pool_asset) + U256::from(stake_asset);

    let nominator1 = rune_after + asset_after;
    let nominator2 =
        U256::from(stake_rune) * asset_after + rune_after * U256::from(stake_asset);
    let denominator = U256::from(4u8) * rune_after * asset_after;
    let stake_units = (nominator1 * nominator2 / denominator).as_u128();
    Ok((old_pool_units + stake_units, stake_units))
}

/// Apply a stake deposit: absorb pending RUNE, mint units, and grow the
/// pool. Returns the units granted (zero for a one-sided deposit that was
/// parked as pending RUNE).
pub fn stake(keeper: &mut Keeper, height: u64, inputs: StakeInputs) -> Result<u128, StakeError> {
    let StakeInputs {
        asset,
        rune_amount,
        asset_amount,
        rune_address,
        asset_address,
        tx_id,
    } = inputs;

    if asset.is_empty() {
        return Err(StakeError::Validation("asset is empty".to_string()));
    }
    if asset.is_rune() {
        return Err(StakeError::Validation("asset cannot be rune".to_string()));
    }
    if tx_id.is_empty() {
        return Err(StakeError::Validation(
            "request tx hash is empty".to_string(),
        ));
    }
    if rune_address.is_empty() {
        return Err(StakeError::Validation("rune address is empty".to_string()));
    }
    if !asset.chain.hosts_rune() && asset_address.is_empty() {
        return Err(StakeError::Validation("asset address is empty".to_string()));
    }
    if rune_amount == 0 && asset_amount == 0 {
        return Err(StakeError::Validation(
            "both rune and asset is zero".to_string(),
        ));
    }

    let mut pool = keeper.get_pool(&asset)?;
    if pool.status == PoolStatus::Suspended {
        return Err(StakeError::PoolSuspended(asset.to_string()));
    }

    let mut staker = keeper.get_staker(&asset, &rune_address)?;
    staker.last_stake_height = height;
    if staker.asset_address.is_empty() {
        staker.asset_address = asset_address;
    } else if staker.asset_address != asset_address {
        // later stakes must come from the address on record; refund
        return Err(StakeError::MismatchAssetAddress);
    }

    let mut rune_amount = rune_amount;
    if !asset.chain.hosts_rune() {
        // the two sides arrive in separate txs; park one-sided RUNE until
        // the asset side shows up
        if asset_amount == 0 {
            staker.pending_rune += rune_amount;
            keeper.set_staker(&staker)?;
            debug!(pool = %asset, pending = staker.pending_rune, "parked pending rune");
            return Ok(0);
        }
        rune_amount += staker.pending_rune;
        staker.pending_rune = 0;
    }

    info!(pool = %asset, rune = rune_amount, asset = asset_amount, "staking");

    let (new_pool_units, staker_units) = calculate_pool_units(
        pool.pool_units,
        pool.balance_rune,
        pool.balance_asset,
        rune_amount,
        asset_amount,
    )?;
    pool.pool_units = new_pool_units;
    pool.balance_rune += rune_amount;
    pool.balance_asset += asset_amount;
    keeper.set_pool(height, &pool)?;

    staker.units += staker_units;
    keeper.set_staker(&staker)?;
    Ok(staker_units)
}

//! Swap execution.

use crate::errors::SwapError;
use rc_02_keeper::Keeper;
use shared_types::{
    Address, Asset, Coin, Event, EventStatus, EventSwap, Pool, Tx, U256,
};
use tracing::{debug, info};

/// Emission for input `x` against depths `{X, Y}`: `x·X·Y / (x+X)²`.
pub fn calc_asset_emission(big_x: u128, x: u128, big_y: u128) -> u128 {
    let denom = U256::from(x) + U256::from(big_x);
    let denom = denom * denom;
    if denom.is_zero() {
        return 0;
    }
    (U256::from(x) * U256::from(big_x) * U256::from(big_y) / denom).as_u128()
}

/// Liquidity fee retained by the pool: `x²·Y / (x+X)²`, in output units.
pub fn calc_liquidity_fee(big_x: u128, x: u128, big_y: u128) -> u128 {
    let denom = U256::from(x) + U256::from(big_x);
    let denom = denom * denom;
    if denom.is_zero() {
        return 0;
    }
    (U256::from(x) * U256::from(x) * U256::from(big_y) / denom).as_u128()
}

/// Price impact in basis points: `x·(2X+x) / X²`, scaled by 10000.
pub fn calc_trade_slip_bps(big_x: u128, x: u128) -> u64 {
    let denom = U256::from(big_x) * U256::from(big_x);
    if denom.is_zero() {
        return 0;
    }
    let numer =
        U256::from(x) * (U256::from(2u8) * U256::from(big_x) + U256::from(x)) * U256::from(10_000u32);
    (numer / denom).min(U256::from(u64::MAX)).as_u64()
}

/// Execute a swap of the first coin of `tx` into `target`, mutating pool
/// state and recording fees and events. Returns the emitted amount.
///
/// A swap between two foreign assets routes through RUNE, touching both
/// pools and emitting two swap events.
#[allow(clippy::too_many_arguments)]
pub fn swap(
    keeper: &mut Keeper,
    height: u64,
    tx: &Tx,
    target: Asset,
    destination: Address,
    trade_target: u128,
    transaction_fee: u128,
) -> Result<u128, SwapError> {
    tx.valid().map_err(|e| SwapError::Validation(e.to_string()))?;
    if target.is_empty() {
        return Err(SwapError::Validation("target is empty".to_string()));
    }
    if destination.is_empty() {
        return Err(SwapError::Validation("destination is empty".to_string()));
    }
    let source_coin = tx
        .coins
        .first()
        .ok_or_else(|| SwapError::Validation("tx has no coins".to_string()))?;
    let source = source_coin.asset.clone();

    // validate every pool the route touches before mutating anything
    for asset in [&source, &target] {
        if asset.is_rune() {
            continue;
        }
        if !keeper.pool_exist(asset)? {
            return Err(SwapError::PoolNotExist(asset.to_string()));
        }
        let pool = keeper.get_pool(asset)?;
        if !pool.is_enabled() {
            return Err(SwapError::PoolNotExist(asset.to_string()));
        }
    }

    let mut hop_tx = tx.clone();
    let is_double_swap = !source.is_rune() && !target.is_rune();
    if is_double_swap {
        let rune_amount = swap_one(keeper, height, &hop_tx, Asset::rune(), trade_target)?;
        info!(source = %source, emit = rune_amount, "first hop complete");
        hop_tx.coins = vec![Coin::rune(rune_amount)].into();
    }

    let emitted = swap_one(keeper, height, &hop_tx, target.clone(), trade_target)?;
    if trade_target > 0 && emitted < trade_target {
        return Err(SwapError::TradeTarget {
            emit: emitted,
            target: trade_target,
        });
    }
    if target.is_rune() && emitted <= transaction_fee {
        return Err(SwapError::NotEnoughFee(emitted));
    }
    Ok(emitted)
}

/// One hop through a single pool. Records the liquidity fee, mutates the
/// pool, and emits a pending swap event.
fn swap_one(
    keeper: &mut Keeper,
    height: u64,
    tx: &Tx,
    target: Asset,
    trade_target: u128,
) -> Result<u128, SwapError> {
    let source_coin = tx
        .coins
        .first()
        .ok_or_else(|| SwapError::Validation("tx has no coins".to_string()))?;
    let source = source_coin.asset.clone();
    let x = source_coin.amount;

    // the pool is always keyed by the non-RUNE side
    let asset = if source.is_rune() {
        target.clone()
    } else {
        source.clone()
    };

    if !keeper.pool_exist(&asset)? {
        return Err(SwapError::PoolNotExist(asset.to_string()));
    }
    let mut pool: Pool = keeper.get_pool(&asset)?;
    if !pool.is_enabled() {
        return Err(SwapError::PoolNotExist(asset.to_string()));
    }

    let (big_x, big_y) = if source.is_rune() {
        (pool.balance_rune, pool.balance_asset)
    } else {
        (pool.balance_asset, pool.balance_rune)
    };

    if x == 0 {
        return Err(SwapError::InvalidAmount);
    }
    if big_x == 0 || big_y == 0 {
        return Err(SwapError::InvalidBalance);
    }

    let emitted = calc_asset_emission(big_x, x, big_y);
    let mut liquidity_fee = calc_liquidity_fee(big_x, x, big_y);
    let trade_slip = calc_trade_slip_bps(big_x, x);

    if emitted == 0 {
        return Err(SwapError::ZeroEmit);
    }
    if emitted > big_y {
        return Err(SwapError::InvalidBalance);
    }

    debug!(
        pool = %pool.asset, x, emitted, liquidity_fee, trade_slip,
        "swapping"
    );

    if source.is_rune() {
        pool.balance_rune = big_x + x;
        pool.balance_asset = big_y - emitted;
        // fee is in asset units here; report it in RUNE at the post-swap
        // ratio
        liquidity_fee = pool.asset_value_in_rune(liquidity_fee);
    } else {
        pool.balance_asset = big_x + x;
        pool.balance_rune = big_y - emitted;
    }

    keeper.add_to_liquidity_fees(height, &pool.asset, liquidity_fee)?;
    keeper.set_pool(height, &pool)?;

    let payload = serde_json::to_value(EventSwap {
        pool: pool.asset.clone(),
        price_target: trade_target,
        trade_slip,
        liquidity_fee,
    })
    .map_err(|e| SwapError::Validation(e.to_string()))?;
    keeper.add_incomplete_event(Event::new(
        EventSwap::TYPE,
        height,
        tx.clone(),
        payload,
        EventStatus::Pending,
    ))?;

    Ok(emitted)
}

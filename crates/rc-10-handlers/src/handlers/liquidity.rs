//! Stake, unstake, add, and reserve handlers.

use crate::messages::{MsgAdd, MsgReserveContributor, MsgSetStakeData, MsgSetUnStake};
use crate::result::{HandlerResult, ResultCode};
use crate::router::HandlerCtx;
use rc_03_amm::{stake, unstake, StakeInputs};
use shared_types::{
    Coin, Event, EventAdd, EventStake, EventStatus, EventUnstake, ReserveContributor, TxOutItem,
};
use tracing::{error, info};

/// Apply a liquidity deposit and emit the stake event.
pub fn handle_stake(ctx: &mut HandlerCtx, msg: MsgSetStakeData) -> HandlerResult {
    if msg.rune_address.is_empty() {
        return HandlerResult::error(ResultCode::StakeFailValidation, "rune address is empty");
    }
    let result = stake(
        ctx.keeper,
        ctx.height,
        StakeInputs {
            asset: msg.asset.clone(),
            rune_amount: msg.rune_amount,
            asset_amount: msg.asset_amount,
            rune_address: msg.rune_address.clone(),
            asset_address: msg.asset_address.clone(),
            tx_id: msg.tx.id.clone(),
        },
    );
    match result {
        Ok(units) => {
            let payload = match serde_json::to_value(EventStake {
                pool: msg.asset.clone(),
                stake_units: units,
            }) {
                Ok(payload) => payload,
                Err(e) => return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string()),
            };
            let event = Event::new(
                EventStake::TYPE,
                ctx.height,
                msg.tx,
                payload,
                EventStatus::Success,
            );
            if let Err(e) = ctx.keeper.set_completed_event(event) {
                return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string());
            }
            HandlerResult::ok()
        }
        Err(err) => {
            error!(error = %err, "stake failed");
            HandlerResult::error((&err).into(), err.to_string())
        }
    }
}

/// Apply a withdrawal: burn units, schedule the two outbound legs, emit
/// the unstake event.
pub fn handle_unstake(ctx: &mut HandlerCtx, msg: MsgSetUnStake) -> HandlerResult {
    let staker = match ctx.keeper.get_staker(&msg.asset, &msg.rune_address) {
        Ok(staker) => staker,
        Err(e) => return HandlerResult::error(ResultCode::FailGetStaker, e.to_string()),
    };
    let result = unstake(
        ctx.keeper,
        ctx.height,
        &msg.rune_address,
        &msg.asset,
        msg.basis_points,
        ctx.constants.transaction_fee,
        ctx.constants.stake_lock_up_blocks,
    );
    let result = match result {
        Ok(result) => result,
        Err(err) => {
            error!(error = %err, "unstake failed");
            return HandlerResult::error((&err).into(), err.to_string());
        }
    };

    // pay the staker out on both sides
    if result.rune_amount > 0 {
        let mut toi = TxOutItem::new(
            shared_types::Chain::Rune,
            msg.rune_address.clone(),
            Coin::rune(result.rune_amount),
            msg.tx.id.clone(),
        );
        toi.memo = String::new();
        if let Err(e) = ctx
            .txout
            .try_add_tx_out_item(ctx.keeper, ctx.constants, toi)
        {
            return HandlerResult::error(ResultCode::FailAddOutboundTx, e.to_string());
        }
    }
    if result.asset_amount > 0 {
        let to = if staker.asset_address.is_empty() {
            msg.tx.from_address.clone()
        } else {
            staker.asset_address.clone()
        };
        let toi = TxOutItem::new(
            msg.asset.chain,
            to,
            Coin::new(msg.asset.clone(), result.asset_amount),
            msg.tx.id.clone(),
        );
        if let Err(e) = ctx
            .txout
            .try_add_tx_out_item(ctx.keeper, ctx.constants, toi)
        {
            return HandlerResult::error(ResultCode::FailAddOutboundTx, e.to_string());
        }
    }

    let payload = match serde_json::to_value(EventUnstake {
        pool: msg.asset.clone(),
        stake_units: result.units_burned,
        basis_points: msg.basis_points,
        asymmetry: 0,
    }) {
        Ok(payload) => payload,
        Err(e) => return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string()),
    };
    let event = Event::new(
        EventUnstake::TYPE,
        ctx.height,
        msg.tx,
        payload,
        EventStatus::Pending,
    );
    if let Err(e) = ctx.keeper.add_incomplete_event(event) {
        return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string());
    }
    info!(pool = %msg.asset, units = result.units_burned, "unstake applied");
    HandlerResult::ok()
}

/// Donate coins straight into a pool without minting units.
pub fn handle_add(ctx: &mut HandlerCtx, msg: MsgAdd) -> HandlerResult {
    if msg.asset.is_empty() || msg.asset.is_rune() {
        return HandlerResult::error(ResultCode::UnknownRequest, "invalid donation asset");
    }
    let mut pool = match ctx.keeper.get_pool(&msg.asset) {
        Ok(pool) => pool,
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    pool.balance_rune += msg.rune_amount;
    pool.balance_asset += msg.asset_amount;
    if let Err(e) = ctx.keeper.set_pool(ctx.height, &pool) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }

    let payload = match serde_json::to_value(EventAdd {
        pool: msg.asset.clone(),
    }) {
        Ok(payload) => payload,
        Err(e) => return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string()),
    };
    let event = Event::new(
        EventAdd::TYPE,
        ctx.height,
        msg.tx,
        payload,
        EventStatus::Success,
    );
    if let Err(e) = ctx.keeper.set_completed_event(event) {
        return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string());
    }
    info!(pool = %msg.asset, rune = msg.rune_amount, asset = msg.asset_amount, "donation added");
    HandlerResult::ok()
}

/// Credit a contribution to the protocol reserve.
pub fn handle_reserve(ctx: &mut HandlerCtx, msg: MsgReserveContributor) -> HandlerResult {
    let contributor = ReserveContributor::new(msg.contributor, msg.amount);
    if !contributor.is_valid() {
        return HandlerResult::error(ResultCode::UnknownRequest, "invalid reserve contributor");
    }
    if let Err(e) = ctx.keeper.add_reserve_contributor(contributor) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    if let Err(e) = ctx.keeper.add_fee_to_reserve(msg.amount) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    info!(amount = msg.amount, "reserve contribution");
    HandlerResult::ok()
}


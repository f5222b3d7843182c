//! Swap handler: validation plus enqueueing. Execution happens at
//! EndBlock when the queue drains in fee order.

use crate::messages::MsgSwap;
use crate::result::{HandlerResult, ResultCode};
use crate::router::HandlerCtx;
use shared_types::QueuedSwap;
use tracing::debug;

/// Validate a swap and put it on the queue.
pub fn handle_swap(ctx: &mut HandlerCtx, msg: MsgSwap) -> HandlerResult {
    if let Err(e) = msg.tx.valid() {
        return HandlerResult::error(ResultCode::UnknownRequest, e.to_string());
    }
    if msg.target_asset.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "target asset is empty");
    }
    let Some(source) = msg.tx.coins.first() else {
        return HandlerResult::error(ResultCode::UnknownRequest, "tx has no coins");
    };
    if source.asset == msg.target_asset {
        return HandlerResult::error(
            ResultCode::UnknownRequest,
            "swap source and target cannot be the same",
        );
    }

    let queued = QueuedSwap::new(
        msg.tx,
        msg.target_asset,
        msg.destination,
        msg.trade_target,
    );
    if let Err(e) = ctx.keeper.set_swap_queue_item(&queued) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    debug!(tx_id = %queued.tx.id, target = %queued.target_asset, "swap enqueued");
    HandlerResult::ok()
}

//! Queue scoring and draining.

use crate::errors::SwapQueueError;
use rc_02_keeper::Keeper;
use rc_03_amm::{calc_liquidity_fee, calc_trade_slip_bps, swap, SwapError};
use rc_06_txout::{refund_tx, TxOutStore};
use shared_types::{Coin, Constants, QueuedSwap, TxOutItem};
use tracing::{debug, info, warn};

/// One scored queue entry.
#[derive(Clone, Debug)]
struct SwapItem {
    swap: QueuedSwap,
    /// Liquidity fee in RUNE against the target pool.
    fee: u128,
    /// Trade slip in basis points.
    slip: u64,
}

/// Drains pending swaps at EndBlock.
pub struct SwapQueue;

impl SwapQueue {
    /// How many items to process for a queue of length `n`: everything
    /// for small queues, otherwise half, capped.
    fn todo_num(n: usize, constants: &Constants) -> usize {
        if n <= constants.min_swaps_per_block {
            return n;
        }
        (n / 2).clamp(constants.min_swaps_per_block, constants.max_swaps_per_block)
    }

    /// Score every queued swap against its target pool. Swaps whose pool
    /// cannot price them score zero and sort last.
    fn score(keeper: &Keeper, swaps: Vec<QueuedSwap>) -> Result<Vec<SwapItem>, SwapQueueError> {
        let mut items = Vec::with_capacity(swaps.len());
        for queued in swaps {
            let mut item = SwapItem {
                swap: queued,
                fee: 0,
                slip: 0,
            };
            let target = &item.swap.target_asset;
            let source_coin = item.swap.tx.coins.first().cloned();
            let Some(source_coin) = source_coin else {
                items.push(item);
                continue;
            };

            // score against the pool of the non-RUNE leg the swap enters
            let pool_asset = if target.is_rune() {
                source_coin.asset.clone()
            } else {
                target.clone()
            };
            let pool = keeper.get_pool(&pool_asset)?;
            if pool.is_empty() || !pool.is_enabled() {
                items.push(item);
                continue;
            }

            let x = source_coin.amount;
            let (big_x, big_y) = if source_coin.asset.is_rune() {
                (pool.balance_rune, pool.balance_asset)
            } else {
                (pool.balance_asset, pool.balance_rune)
            };
            let mut fee = calc_liquidity_fee(big_x, x, big_y);
            if source_coin.asset.is_rune() {
                fee = pool.asset_value_in_rune(fee);
            }
            item.fee = fee;
            item.slip = calc_trade_slip_bps(big_x, x);
            items.push(item);
        }
        Ok(items)
    }

    /// Sort by `(fee desc, slip desc, tx id asc)`.
    fn sort(mut items: Vec<SwapItem>) -> Vec<SwapItem> {
        items.sort_by(|a, b| {
            b.fee
                .cmp(&a.fee)
                .then_with(|| b.slip.cmp(&a.slip))
                .then_with(|| a.swap.tx.id.cmp(&b.swap.tx.id))
        });
        items
    }

    /// EndBlock: score, sort, and execute the block's share of the queue.
    /// Failed swaps are refunded.
    pub fn end_block(
        keeper: &mut Keeper,
        txout: &TxOutStore,
        constants: &Constants,
        height: u64,
    ) -> Result<(), SwapQueueError> {
        let queue = keeper.get_swap_queue()?;
        if queue.is_empty() {
            return Ok(());
        }
        let todo = Self::todo_num(queue.len(), constants);
        debug!(queued = queue.len(), todo, "draining swap queue");

        let items = Self::sort(Self::score(keeper, queue)?);
        for item in items.into_iter().take(todo) {
            Self::execute(keeper, txout, constants, height, &item.swap)?;
            keeper.remove_swap_queue_item(&item.swap.tx.id)?;
        }
        Ok(())
    }

    fn execute(
        keeper: &mut Keeper,
        txout: &TxOutStore,
        constants: &Constants,
        height: u64,
        queued: &QueuedSwap,
    ) -> Result<(), SwapQueueError> {
        let destination = if queued.destination.is_empty() {
            queued.tx.from_address.clone()
        } else {
            queued.destination.clone()
        };
        let transaction_fee = keeper.constant_or_mimir(
            shared_types::constants::mimir_keys::TRANSACTION_FEE,
            constants.transaction_fee,
        )?;

        // both hops of a double swap commit or neither does
        keeper.begin_tx();
        match swap(
            keeper,
            height,
            &queued.tx,
            queued.target_asset.clone(),
            destination.clone(),
            queued.trade_target,
            transaction_fee,
        ) {
            Ok(emitted) => {
                keeper.commit_tx();
                info!(tx_id = %queued.tx.id, emitted, target = %queued.target_asset, "swap executed");
                let mut toi = TxOutItem::new(
                    queued.target_asset.chain,
                    destination,
                    Coin::new(queued.target_asset.clone(), emitted),
                    queued.tx.id.clone(),
                );
                toi.memo = String::new(); // defaults to OUTBOUND:<in_hash>
                txout.try_add_tx_out_item(keeper, constants, toi)?;
                Ok(())
            }
            Err(err) => {
                keeper.rollback_tx();
                warn!(tx_id = %queued.tx.id, error = %err, "fail to swap, refunding");
                refund_tx(
                    keeper,
                    txout,
                    constants,
                    &queued.tx,
                    height,
                    swap_error_code(&err),
                    &err.to_string(),
                )?;
                Ok(())
            }
        }
    }
}

fn swap_error_code(err: &SwapError) -> u32 {
    match err {
        SwapError::PoolNotExist(_) => 108,
        SwapError::TradeTarget { .. } => 109,
        SwapError::NotEnoughFee(_) => 110,
        SwapError::InvalidAmount => 111,
        SwapError::InvalidBalance => 112,
        SwapError::ZeroEmit => 113,
        SwapError::Validation(_) => 105,
        SwapError::Keeper(_) => 1,
    }
}

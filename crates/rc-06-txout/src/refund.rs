//! Refunds: return an inbound's coins when its action failed.

use crate::errors::TxOutError;
use crate::store::TxOutStore;
use rc_01_memo::Memo;
use rc_02_keeper::Keeper;
use shared_types::{
    Constants, Event, EventRefund, EventStatus, PoolStatus, Tx, TxOutItem,
};
use tracing::{info, warn};

/// Schedule a refund of every coin of `tx` back to its sender, minus the
/// standard fee. Coins with no pool to value the fee against cannot be
/// refunded; they bootstrap a pool instead and stay with the network.
pub fn refund_tx(
    keeper: &mut Keeper,
    txout: &TxOutStore,
    constants: &Constants,
    tx: &Tx,
    height: u64,
    code: u32,
    reason: &str,
) -> Result<(), TxOutError> {
    let mut scheduled = 0usize;
    for coin in tx.coins.iter() {
        let refundable = coin.is_rune() || keeper.pool_exist(&coin.asset)?;
        if refundable {
            let mut toi = TxOutItem::new(
                tx.chain,
                tx.from_address.clone(),
                coin.clone(),
                tx.id.clone(),
            );
            toi.memo = Memo::Refund {
                tx_id: tx.id.clone(),
            }
            .to_string();
            if txout.try_add_tx_out_item(keeper, constants, toi)? {
                scheduled += 1;
            }
            continue;
        }
        // no pool means no way to price the fee; keep the coins and open
        // a bootstrap pool for them (airdrop semantics)
        let mut pool = keeper.get_pool(&coin.asset)?;
        pool.status = PoolStatus::Bootstrap;
        pool.balance_asset += coin.amount;
        keeper.set_pool(height, &pool)?;
        warn!(asset = %coin.asset, amount = coin.amount, "unrefundable coin absorbed into bootstrap pool");
    }

    info!(tx_id = %tx.id, code, reason, scheduled, "refund issued");
    let payload = serde_json::to_value(EventRefund {
        code,
        reason: reason.to_string(),
    })
    .map_err(|e| rc_02_keeper::KeeperError::Codec {
        key: "refund-event".to_string(),
        reason: e.to_string(),
    })?;
    let event = Event::new(
        EventRefund::TYPE,
        height,
        tx.clone(),
        payload,
        EventStatus::Refund,
    );
    if scheduled > 0 {
        keeper.add_incomplete_event(event)?;
    } else {
        keeper.set_completed_event(event)?;
    }
    Ok(())
}

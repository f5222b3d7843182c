//! Operator and no-op handlers.

use crate::messages::{MsgMimir, MsgNoOp};
use crate::result::{HandlerResult, ResultCode};
use crate::router::HandlerCtx;
use shared_types::{Event, EventAdminConfig, EventStatus, Tx, TxId};
use tracing::info;

/// Apply an operator override and emit the admin-config event.
pub fn handle_mimir(ctx: &mut HandlerCtx, msg: MsgMimir) -> HandlerResult {
    if msg.key.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "mimir key cannot be empty");
    }
    if let Err(e) = ctx.keeper.set_mimir(&msg.key, msg.value) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    info!(key = %msg.key, value = msg.value, "mimir override set");

    let payload = match serde_json::to_value(EventAdminConfig {
        key: msg.key,
        value: msg.value.to_string(),
    }) {
        Ok(payload) => payload,
        Err(e) => return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string()),
    };
    let mut in_tx = Tx::default();
    in_tx.id = TxId::blank();
    let event = Event::new(
        EventAdminConfig::TYPE,
        ctx.height,
        in_tx,
        payload,
        EventStatus::Success,
    );
    if let Err(e) = ctx.keeper.set_completed_event(event) {
        return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string());
    }
    HandlerResult::ok()
}

/// Accept and ignore.
pub fn handle_noop(_ctx: &mut HandlerCtx, _msg: MsgNoOp) -> HandlerResult {
    HandlerResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_02_keeper::{Keeper, MemoryStore};
    use rc_06_txout::TxOutStore;
    use shared_types::{Constants, NodeAddress};

    #[test]
    fn test_mimir_sets_override() {
        let mut keeper = Keeper::new(Box::new(MemoryStore::new()));
        let txout = TxOutStore::new();
        let constants = Constants::default();
        let mut ctx = HandlerCtx {
            keeper: &mut keeper,
            txout: &txout,
            constants: &constants,
            height: 2,
        };
        let result = handle_mimir(
            &mut ctx,
            MsgMimir {
                key: "TransactionFee".to_string(),
                value: 200_000_000,
                signer: NodeAddress::new("rune1admin"),
            },
        );
        assert!(result.is_ok(), "{}", result.log);
        assert_eq!(keeper.get_mimir("TransactionFee").unwrap(), Some(200_000_000));
        // an admin-config event was recorded
        assert_eq!(keeper.get_last_event_id().unwrap(), 1);
    }
}

//! Vault operation handlers: outbound acknowledgements, migrations,
//! teardown refunds, yggdrasil transfers, and TSS results.

use crate::handlers::observed::finalize_outbound;
use crate::messages::{
    MsgMigrate, MsgOutboundTx, MsgRagnarok, MsgTssKeysignFail, MsgTssPool, MsgYggdrasil,
};
use crate::result::{HandlerResult, ResultCode};
use crate::router::HandlerCtx;
use rc_02_keeper::TssVoter;
use rc_05_vaults::VaultMgr;
use rc_09_validators::{Slasher, ValidatorMgr};
use tracing::info;

/// Finalize an observed outbound. Idempotent: re-applying after the item
/// is sealed changes nothing.
pub fn handle_outbound_tx(ctx: &mut HandlerCtx, msg: MsgOutboundTx) -> HandlerResult {
    if msg.in_tx_id.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "in tx id cannot be empty");
    }
    match finalize_outbound(ctx, &msg.tx) {
        Ok(()) => HandlerResult::ok(),
        Err(result) => result,
    }
}

/// Seal an observed vault migration. A migrate whose matching item is
/// already sealed is a no-op with success.
pub fn handle_migrate(ctx: &mut HandlerCtx, msg: MsgMigrate) -> HandlerResult {
    if msg.block_height == 0 {
        return HandlerResult::error(ResultCode::UnknownRequest, "invalid block height");
    }
    match finalize_outbound(ctx, &msg.tx) {
        Ok(()) => HandlerResult::ok(),
        Err(result) => result,
    }
}

/// Seal an observed teardown refund.
pub fn handle_ragnarok(ctx: &mut HandlerCtx, msg: MsgRagnarok) -> HandlerResult {
    if msg.block_height == 0 {
        return HandlerResult::error(ResultCode::UnknownRequest, "invalid block height");
    }
    match finalize_outbound(ctx, &msg.tx) {
        Ok(()) => HandlerResult::ok(),
        Err(result) => result,
    }
}

/// Credit or drain a yggdrasil vault after its transfer was observed.
pub fn handle_yggdrasil(ctx: &mut HandlerCtx, msg: MsgYggdrasil) -> HandlerResult {
    if msg.pub_key.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "pub key cannot be empty");
    }
    let mut ygg = match ctx.keeper.get_yggdrasil(&msg.pub_key, ctx.height) {
        Ok(ygg) => ygg,
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    if !ygg.is_yggdrasil() {
        return HandlerResult::error(ResultCode::UnknownRequest, "vault is not yggdrasil");
    }
    if msg.add_funds {
        ygg.add_funds(&msg.coins);
    } else {
        ygg.sub_funds(&msg.coins);
    }
    if let Err(e) = ctx.keeper.set_vault(&ygg) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    info!(vault = %msg.pub_key, add = msg.add_funds, "yggdrasil funds updated");
    HandlerResult::ok()
}

/// Record a keygen result. On supermajority of a successful ceremony the
/// new asgard activates and the member set becomes the validator set; a
/// failed ceremony slashes everyone blamed.
pub fn handle_tss_pool(ctx: &mut HandlerCtx, msg: MsgTssPool) -> HandlerResult {
    if msg.id.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "tss id cannot be empty");
    }
    if msg.blame.is_empty() && msg.pool_pub_key.is_empty() {
        return HandlerResult::error(
            ResultCode::UnknownRequest,
            "successful keygen must carry a pool pub key",
        );
    }

    let mut voter = match ctx.keeper.get_tss_voter(&msg.id) {
        Ok(Some(voter)) => voter,
        Ok(None) => TssVoter::new(msg.id.clone(), msg.pool_pub_key.clone(), msg.pub_keys.clone()),
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    voter.sign(msg.signer);
    let active = ctx.keeper.total_active_node_accounts().unwrap_or(0);
    let reached = voter.has_consensus(active) && voter.block_height == 0;
    if reached {
        voter.block_height = ctx.height;
    }
    if let Err(e) = ctx.keeper.set_tss_voter(&voter) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    if !reached {
        return HandlerResult::ok();
    }

    if !msg.blame.is_empty() {
        // ceremony failed; everyone named pays
        if let Err(e) = Slasher::slash_blamed_nodes(
            ctx.keeper,
            &msg.blame,
            ctx.constants.fail_keygen_slash_points,
        ) {
            return HandlerResult::error(ResultCode::Internal, e.to_string());
        }
        return HandlerResult::ok();
    }

    info!(id = %msg.id, pool = %msg.pool_pub_key, "keygen complete, rotating");
    if let Err(e) = VaultMgr::rotate_vault(ctx.keeper, ctx.height, msg.pool_pub_key) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    if let Err(e) = ValidatorMgr::rotate_validator_set(ctx.keeper, &msg.pub_keys, ctx.height) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    HandlerResult::ok()
}

/// Record a keysign failure: the blamed nodes take the keysign penalty,
/// once per failure id.
pub fn handle_tss_keysign_fail(ctx: &mut HandlerCtx, msg: MsgTssKeysignFail) -> HandlerResult {
    if msg.id.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "tss id cannot be empty");
    }
    if msg.blame.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "blame cannot be empty");
    }

    let mut voter = match ctx.keeper.get_tss_voter(&msg.id) {
        Ok(Some(voter)) => voter,
        Ok(None) => TssVoter::new(msg.id.clone(), Default::default(), Vec::new()),
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    voter.sign(msg.signer);
    let active = ctx.keeper.total_active_node_accounts().unwrap_or(0);
    let reached = voter.has_consensus(active) && voter.block_height == 0;
    if reached {
        voter.block_height = ctx.height;
    }
    if let Err(e) = ctx.keeper.set_tss_voter(&voter) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    if !reached {
        return HandlerResult::ok();
    }

    if let Err(e) = Slasher::slash_blamed_nodes(
        ctx.keeper,
        &msg.blame,
        ctx.constants.fail_key_sign_slash_points,
    ) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    HandlerResult::ok()
}

//! Node account handlers: bonding, leaving, key registration, versions,
//! and ban votes.

use crate::messages::{MsgBan, MsgBond, MsgLeave, MsgSetNodeKeys, MsgSetVersion};
use crate::result::{HandlerResult, ResultCode};
use crate::router::HandlerCtx;
use rc_05_vaults::request_ygg_return;
use rc_06_txout::TxOutStore;
use shared_types::{
    Chain, Coin, Event, EventBond, EventStatus, NodeStatus, Tx, TxId, TxOutItem,
};
use tracing::{info, warn};

/// Credit a bond to a node account, creating it on first bond.
pub fn handle_bond(ctx: &mut HandlerCtx, msg: MsgBond) -> HandlerResult {
    if msg.node_address.is_empty() {
        return HandlerResult::error(ResultCode::InvalidAddress, "node address is empty");
    }
    if msg.bond == 0 {
        return HandlerResult::error(ResultCode::UnknownRequest, "bond cannot be zero");
    }
    let mut na = match ctx.keeper.get_node_account(&msg.node_address) {
        Ok(na) => na,
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    let exists = match ctx.keeper.node_account_exists(&msg.node_address) {
        Ok(exists) => exists,
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    if !exists {
        na.update_status(NodeStatus::WhiteListed, ctx.height);
        na.bond_address = msg.bond_address.clone();
    }
    na.bond += msg.bond;
    if na.bond_address.is_empty() {
        na.bond_address = msg.bond_address.clone();
    }
    if let Err(e) = ctx.keeper.set_node_account(&na) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }

    let payload = match serde_json::to_value(EventBond {
        amount: msg.bond,
        bond_type: "bond_paid".to_string(),
    }) {
        Ok(payload) => payload,
        Err(e) => return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string()),
    };
    let event = Event::new(
        EventBond::TYPE,
        ctx.height,
        msg.tx,
        payload,
        EventStatus::Success,
    );
    if let Err(e) = ctx.keeper.set_completed_event(event) {
        return HandlerResult::error(ResultCode::FailSaveEvent, e.to_string());
    }
    info!(node = %msg.node_address, bond = msg.bond, "bond credited");
    HandlerResult::ok()
}

/// A node operator asks to leave. Active nodes are marked and churn out
/// at the next rotation (with their yggdrasil recalled); inactive ones
/// get their bond straight back.
pub fn handle_leave(ctx: &mut HandlerCtx, msg: MsgLeave) -> HandlerResult {
    // only the bond address may ask
    let requester = &msg.tx.from_address;
    let node = match ctx
        .keeper
        .list_node_accounts()
        .map(|nodes| nodes.into_iter().find(|na| &na.bond_address == requester))
    {
        Ok(Some(node)) => node,
        Ok(None) => {
            return HandlerResult::error(
                ResultCode::Unauthorized,
                format!("{requester} is not a bond address"),
            )
        }
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };

    let mut node = node;
    if node.requested_to_leave {
        // already marked; applying again changes nothing
        return HandlerResult::ok();
    }
    node.requested_to_leave = true;
    node.leave_height = ctx.height;

    if node.is_active() {
        // bond stays escrowed until the yggdrasil funds come home
        if let Err(e) = request_ygg_return(ctx.keeper, ctx.txout, ctx.height, &node) {
            warn!(error = %e, "fail to request yggdrasil return");
        }
        if let Err(e) = ctx.keeper.set_node_account(&node) {
            return HandlerResult::error(ResultCode::Internal, e.to_string());
        }
        info!(node = %node.node_address, "leave requested, awaiting churn");
        return HandlerResult::ok();
    }

    // not in the signing set: refund the bond now
    let bond = node.bond;
    node.bond = 0;
    if let Err(e) = ctx.keeper.set_node_account(&node) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    if bond > 0 {
        if let Err(result) = refund_bond(ctx.keeper, ctx.txout, &node.bond_address, bond, &msg.tx)
        {
            return result;
        }
    }
    info!(node = %node.node_address, bond, "inactive node left, bond refunded");
    HandlerResult::ok()
}

fn refund_bond(
    keeper: &mut rc_02_keeper::Keeper,
    txout: &TxOutStore,
    bond_address: &shared_types::Address,
    bond: u128,
    tx: &Tx,
) -> Result<(), HandlerResult> {
    let mut toi = TxOutItem::new(
        Chain::Rune,
        bond_address.clone(),
        Coin::rune(bond),
        tx.id.clone(),
    );
    toi.memo = String::new();
    txout
        .unsafe_add_tx_out_item(keeper, toi)
        .map_err(|e| HandlerResult::error(ResultCode::FailAddOutboundTx, e.to_string()))
}

/// Register a node's signing and consensus keys. The account flips from
/// WhiteListed to Standby and becomes a recognized observer.
pub fn handle_set_node_keys(ctx: &mut HandlerCtx, msg: MsgSetNodeKeys) -> HandlerResult {
    if msg.node_pub_key.is_empty() || msg.validator_cons_pub_key.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "pub keys cannot be empty");
    }
    // a key may only ever belong to one node
    match ctx.keeper.get_node_account_by_pub_key(&msg.node_pub_key) {
        Ok(Some(existing)) if existing.node_address != msg.signer => {
            return HandlerResult::error(
                ResultCode::UnknownRequest,
                format!("{} already in use", msg.node_pub_key),
            );
        }
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
        _ => {}
    }

    let mut na = match ctx.keeper.get_node_account(&msg.signer) {
        Ok(na) => na,
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    na.pub_key_set.node_pub_key = msg.node_pub_key;
    na.pub_key_set.validator_cons_pub_key = msg.validator_cons_pub_key;
    if na.status == NodeStatus::WhiteListed {
        na.update_status(NodeStatus::Standby, ctx.height);
    }
    if let Err(e) = ctx.keeper.set_node_account(&na) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    if let Err(e) = ctx.keeper.set_active_observer(&msg.signer) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    info!(node = %msg.signer, "node keys registered");
    HandlerResult::ok()
}

/// Record the version a node runs; churn eligibility depends on it.
pub fn handle_set_version(ctx: &mut HandlerCtx, msg: MsgSetVersion) -> HandlerResult {
    let mut na = match ctx.keeper.get_node_account(&msg.signer) {
        Ok(na) => na,
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    if msg.version > na.version {
        na.version = msg.version;
        if let Err(e) = ctx.keeper.set_node_account(&na) {
            return HandlerResult::error(ResultCode::Internal, e.to_string());
        }
        info!(node = %msg.signer, version = %msg.version, "version updated");
    }
    HandlerResult::ok()
}

/// Vote to force a node out. On supermajority the node is marked for the
/// next churn and can never rejoin.
pub fn handle_ban(ctx: &mut HandlerCtx, msg: MsgBan) -> HandlerResult {
    if msg.node_address == msg.signer {
        return HandlerResult::error(ResultCode::UnknownRequest, "cannot ban yourself");
    }
    let mut voter = match ctx.keeper.get_ban_voter(&msg.node_address) {
        Ok(voter) => voter,
        Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
    };
    voter.sign(msg.signer);
    let active = ctx.keeper.total_active_node_accounts().unwrap_or(0);
    if voter.has_consensus(active) && voter.block_height == 0 {
        voter.block_height = ctx.height;
        let mut na = match ctx.keeper.get_node_account(&msg.node_address) {
            Ok(na) => na,
            Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
        };
        na.forced_to_leave = true;
        na.leave_height = ctx.height;
        if let Err(e) = ctx.keeper.set_node_account(&na) {
            return HandlerResult::error(ResultCode::Internal, e.to_string());
        }
        info!(node = %msg.node_address, "node banned");
    }
    if let Err(e) = ctx.keeper.set_ban_voter(&voter) {
        return HandlerResult::error(ResultCode::Internal, e.to_string());
    }
    HandlerResult::ok()
}

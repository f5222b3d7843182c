//! Observation handlers: the inbound pipeline and the outbound
//! correlation that closes the loop.

use crate::messages::{
    Msg, MsgAdd, MsgBond, MsgErrataTx, MsgLeave, MsgNoOp, MsgObservedTxIn, MsgObservedTxOut,
    MsgReserveContributor, MsgSetStakeData, MsgSetUnStake, MsgSwap,
};
use crate::result::{HandlerResult, ResultCode};
use crate::router::{HandlerCtx, Router};
use rc_01_memo::Memo;
use rc_04_observer::{add_observed_tx, apply_errata, VoteOutcome};
use rc_06_txout::refund_tx;
use rc_09_validators::Slasher;
use shared_types::{
    Address, EventOutbound, EventStatus, NodeAddress, ObservedTx, Tx, TxId,
};
use tracing::{error, info, warn};

/// Witnesses for inbound transactions. On consensus the memo is decoded
/// and acted on; failures refund the sender minus the fee.
pub fn handle_observed_tx_in(ctx: &mut HandlerCtx, msg: MsgObservedTxIn) -> HandlerResult {
    if msg.txs.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "no observed txs");
    }
    for observed in msg.txs {
        let outcome = match add_observed_tx(
            ctx.keeper,
            observed.clone(),
            msg.signer.clone(),
            active_count(ctx),
            ctx.height,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "invalid witness skipped");
                continue;
            }
        };
        let VoteOutcome::Consensus(agreed) = outcome else {
            continue;
        };

        // the funds physically arrived at the vault
        if let Ok(mut vault) = ctx.keeper.get_vault(&agreed.observed_pub_key) {
            vault.add_funds(&agreed.tx.coins);
            if ctx.keeper.set_vault(&vault).is_err() {
                return HandlerResult::error(ResultCode::Internal, "fail to save vault");
            }
        } else {
            warn!(vault = %agreed.observed_pub_key, "inbound to unknown vault");
        }
        if ctx.keeper.add_chain(agreed.tx.chain).is_err() {
            return HandlerResult::error(ResultCode::Internal, "fail to record chain");
        }

        // act on the intent
        match tx_in_to_msg(&agreed, &msg.signer) {
            Ok(Some(inner)) => {
                let result = Router::handle(ctx, inner);
                if !result.is_ok() {
                    info!(tx_id = %agreed.tx.id, code = ?result.code, log = %result.log,
                        "inbound action failed, refunding");
                    schedule_refund(ctx, &agreed.tx, result.code, &result.log);
                }
            }
            Ok(None) => {}
            Err((code, reason)) => {
                info!(tx_id = %agreed.tx.id, ?code, reason = %reason, "unusable memo, refunding");
                schedule_refund(ctx, &agreed.tx, code, &reason);
            }
        }
    }
    HandlerResult::ok()
}

/// Witnesses for outbound transactions. On consensus: debit the vault,
/// correlate against the scheduled items and the voter's actions, slash
/// over-sends, and complete the pending events.
pub fn handle_observed_tx_out(ctx: &mut HandlerCtx, msg: MsgObservedTxOut) -> HandlerResult {
    if msg.txs.is_empty() {
        return HandlerResult::error(ResultCode::UnknownRequest, "no observed txs");
    }
    for observed in msg.txs {
        let outcome = match add_observed_tx(
            ctx.keeper,
            observed.clone(),
            msg.signer.clone(),
            active_count(ctx),
            ctx.height,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "invalid witness skipped");
                continue;
            }
        };
        let VoteOutcome::Consensus(agreed) = outcome else {
            continue;
        };
        if let Err(result) = finalize_outbound(ctx, &agreed) {
            return result;
        }
    }
    HandlerResult::ok()
}

pub(crate) fn finalize_outbound(
    ctx: &mut HandlerCtx,
    agreed: &ObservedTx,
) -> Result<(), HandlerResult> {
    let internal = |e: rc_02_keeper::KeeperError| {
        HandlerResult::error(ResultCode::Internal, e.to_string())
    };

    // the funds physically left the vault (coins plus the gas burned)
    if let Ok(mut vault) = ctx.keeper.get_vault(&agreed.observed_pub_key) {
        vault.sub_funds(&agreed.tx.coins);
        vault.sub_funds(&agreed.tx.gas);
        // one in-flight transfer came home
        if !vault.pending_tx_block_heights.is_empty() {
            vault.pending_tx_block_heights.remove(0);
        }
        ctx.keeper.set_vault(&vault).map_err(internal)?;
    } else {
        warn!(vault = %agreed.observed_pub_key, "outbound from unknown vault");
    }

    // the burned gas is owed back to the pools; the reward engine settles
    // it at EndBlock
    if !agreed.tx.gas.is_empty() {
        let mut vault_data = ctx.keeper.get_vault_data().map_err(internal)?;
        for gas_coin in agreed.tx.gas.iter() {
            vault_data.gas.add(gas_coin.clone());
        }
        ctx.keeper.set_vault_data(&vault_data).map_err(internal)?;
    }

    // which inbound does this answer?
    let memo = agreed.tx.memo.parse::<Memo>().ok();
    let in_hash = memo
        .as_ref()
        .and_then(|m| m.tx_id().cloned())
        .unwrap_or_else(TxId::blank);

    // seal the matching scheduled item(s)
    let mut over_send_checked = false;
    for mut batch in ctx.keeper.get_txouts_since(0).map_err(internal)? {
        let mut dirty = false;
        for item in batch.tx_array.iter_mut() {
            if !item.out_hash.is_empty() {
                continue;
            }
            if item.vault_pub_key != agreed.observed_pub_key {
                continue;
            }
            if item.to_address != agreed.tx.to_address {
                continue;
            }
            let sent = agreed.tx.coins.amount_of(&item.coin.asset);
            if sent == 0 {
                continue;
            }
            // a vault sending more than it was told to is a theft
            // attempt by its owner
            if sent > item.coin.amount && !over_send_checked {
                let overage = sent - item.coin.amount;
                Slasher::slash_node_account(
                    ctx.keeper,
                    &agreed.observed_pub_key,
                    &item.coin.asset,
                    overage,
                )
                .map_err(|e| HandlerResult::error(ResultCode::Internal, e.to_string()))?;
                over_send_checked = true;
            }
            item.out_hash = agreed.tx.id.clone();
            dirty = true;

            // internal items carry markers; consume one on observation
            if item.in_hash.is_blank() {
                let hash = item.tx_hash();
                let markers = ctx.keeper.get_tx_markers(&hash).map_err(internal)?;
                if !markers.is_empty() {
                    ctx.keeper
                        .set_tx_markers(&hash, &markers[1..])
                        .map_err(internal)?;
                }
            }
            break;
        }
        if dirty {
            ctx.keeper
                .set_last_signed_height(batch.height)
                .map_err(internal)?;
            ctx.keeper.set_txout(&batch).map_err(internal)?;
        }
    }

    // grow the inbound voter's out_txs and complete its events
    if !in_hash.is_blank() {
        let mut voter = ctx.keeper.get_observed_tx_voter(&in_hash).map_err(internal)?;
        voter.add_out_tx(agreed.tx.clone());
        let pending = voter.actions.len().max(1);
        ctx.keeper.set_observed_tx_voter(&voter).map_err(internal)?;

        let status = match memo {
            Some(Memo::Refund { .. }) => EventStatus::Refund,
            _ => EventStatus::Success,
        };
        ctx.keeper
            .complete_events(&in_hash, agreed.tx.clone(), pending, status)
            .map_err(internal)?;

        let payload = serde_json::to_value(EventOutbound {
            in_tx_id: in_hash.clone(),
            tx: agreed.tx.clone(),
        })
        .map_err(|e| HandlerResult::error(ResultCode::FailSaveEvent, e.to_string()))?;
        let mut in_tx = Tx::default();
        in_tx.id = in_hash.clone();
        ctx.keeper
            .set_completed_event(shared_types::Event::new(
                EventOutbound::TYPE,
                ctx.height,
                in_tx,
                payload,
                status,
            ))
            .map_err(internal)?;
    }

    info!(tx_id = %agreed.tx.id, %in_hash, "outbound finalized");
    Ok(())
}

/// Errata votes.
pub fn handle_errata_tx(ctx: &mut HandlerCtx, msg: MsgErrataTx) -> HandlerResult {
    match apply_errata(
        ctx.keeper,
        &msg.tx_id,
        msg.chain,
        msg.signer,
        active_count(ctx),
        ctx.height,
    ) {
        Ok(_) => HandlerResult::ok(),
        Err(e) => HandlerResult::error(ResultCode::Internal, e.to_string()),
    }
}

/// Decode a consensus inbound into the domain message its memo asks for.
/// `Ok(None)` means the tx needs no action (internal transfers arriving
/// at their destination vault, explicit no-ops).
fn tx_in_to_msg(
    observed: &ObservedTx,
    signer: &NodeAddress,
) -> Result<Option<Msg>, (ResultCode, String)> {
    let tx = &observed.tx;
    let memo = tx
        .memo
        .parse::<Memo>()
        .map_err(|e| (ResultCode::UnknownRequest, e.to_string()))?;

    let rune_amount = tx
        .coins
        .iter()
        .find(|c| c.is_rune())
        .map(|c| c.amount)
        .unwrap_or(0);

    match memo {
        Memo::Stake { asset, address } => {
            let asset_amount = tx
                .coins
                .iter()
                .find(|c| c.asset == asset)
                .map(|c| c.amount)
                .unwrap_or(0);
            // the memo address names the side of the position this tx
            // does not cover
            let (rune_address, asset_address) = if tx.chain.hosts_rune() {
                (tx.from_address.clone(), address)
            } else {
                (address, tx.from_address.clone())
            };
            if rune_address.is_empty() {
                return Err((
                    ResultCode::StakeFailValidation,
                    "rune address is empty".to_string(),
                ));
            }
            Ok(Some(Msg::SetStakeData(MsgSetStakeData {
                asset,
                rune_amount,
                asset_amount,
                rune_address,
                asset_address,
                tx: tx.clone(),
                signer: signer.clone(),
            })))
        }
        Memo::Unstake {
            asset,
            basis_points,
        } => Ok(Some(Msg::SetUnStake(MsgSetUnStake {
            asset,
            basis_points,
            rune_address: tx.from_address.clone(),
            tx: tx.clone(),
            signer: signer.clone(),
        }))),
        Memo::Swap {
            asset,
            destination,
            slip_limit,
        } => Ok(Some(Msg::Swap(MsgSwap {
            tx: tx.clone(),
            target_asset: asset,
            destination,
            trade_target: slip_limit,
            signer: signer.clone(),
        }))),
        Memo::Add { asset } => {
            let asset_amount = tx
                .coins
                .iter()
                .find(|c| c.asset == asset)
                .map(|c| c.amount)
                .unwrap_or(0);
            Ok(Some(Msg::Add(MsgAdd {
                asset,
                rune_amount,
                asset_amount,
                tx: tx.clone(),
                signer: signer.clone(),
            })))
        }
        Memo::Bond { node_address } => Ok(Some(Msg::Bond(MsgBond {
            node_address,
            bond: rune_amount,
            bond_address: tx.from_address.clone(),
            tx: tx.clone(),
            signer: signer.clone(),
        }))),
        Memo::Leave => Ok(Some(Msg::Leave(MsgLeave {
            tx: tx.clone(),
            signer: signer.clone(),
        }))),
        Memo::Reserve => Ok(Some(Msg::ReserveContributor(MsgReserveContributor {
            contributor: tx.from_address.clone(),
            amount: rune_amount,
            tx: tx.clone(),
            signer: signer.clone(),
        }))),
        // an internal transfer arriving at its destination vault; the
        // credit already happened
        Memo::Migrate { .. }
        | Memo::Ragnarok { .. }
        | Memo::YggdrasilFund { .. }
        | Memo::YggdrasilReturn { .. }
        | Memo::Outbound { .. }
        | Memo::Refund { .. } => Ok(None),
        Memo::NoOp => Ok(Some(Msg::NoOp(MsgNoOp {
            tx: tx.clone(),
            signer: signer.clone(),
        }))),
        // asset switching has no pool semantics on this network
        Memo::Switch { .. } => Err((
            ResultCode::UnknownRequest,
            "switch is not supported".to_string(),
        )),
    }
}

fn active_count(ctx: &HandlerCtx) -> usize {
    ctx.keeper.total_active_node_accounts().unwrap_or(0)
}

pub(crate) fn schedule_refund(ctx: &mut HandlerCtx, tx: &Tx, code: ResultCode, reason: &str) {
    if tx.id.is_empty() || tx.id.is_blank() || tx.from_address == Address::none() {
        return;
    }
    if let Err(e) = refund_tx(
        ctx.keeper,
        ctx.txout,
        ctx.constants,
        tx,
        ctx.height,
        code as u32,
        reason,
    ) {
        error!(error = %e, tx_id = %tx.id, "fail to schedule refund");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_02_keeper::{Keeper, MemoryStore};
    use rc_06_txout::TxOutStore;
    use shared_types::{
        Asset, Chain, Coin, Coins, Constants, Gas, NodeAccount, NodePubKeys, NodeStatus,
        PubKey, Vault, VaultStatus, VaultType, ONE,
    };

    fn active_node(n: u8) -> NodeAccount {
        NodeAccount::new(
            NodeAddress::new(&format!("rune1node{n}")),
            NodeStatus::Active,
            NodePubKeys {
                node_pub_key: PubKey::new(&format!("node-pk-{n}")),
                validator_cons_pub_key: PubKey::new(&format!("cons-pk-{n}")),
            },
            100 * ONE,
            Address::new("rune1bond"),
            1,
        )
    }

    fn seeded_keeper() -> Keeper {
        let mut keeper = Keeper::new(Box::new(MemoryStore::new()));
        for n in 0..4 {
            keeper.set_node_account(&active_node(n)).unwrap();
        }
        let mut vault = Vault::new(
            VaultType::Asgard,
            VaultStatus::Active,
            1,
            PubKey::new("asgard-pk"),
        );
        vault.add_funds(&Coins::from(vec![
            Coin::rune(10_000 * ONE),
            Coin::new(Asset::new(Chain::Bnb, "BNB"), 10_000 * ONE),
        ]));
        keeper.set_vault(&vault).unwrap();
        keeper
    }

    fn observed(memo: &str, coins: Vec<Coin>) -> ObservedTx {
        let tx = Tx::new(
            TxId::from_hash(memo.as_bytes()),
            Chain::Bnb,
            Address::new("bnb1sender"),
            Address::new("bnb1vault"),
            coins.into(),
            Gas::default(),
            memo,
        );
        ObservedTx::new(tx, 900, PubKey::new("asgard-pk"))
    }

    fn deliver(keeper: &mut Keeper, store: &TxOutStore, observed_tx: ObservedTx) {
        let constants = Constants::default();
        for n in 0..3 {
            let mut ctx = HandlerCtx {
                keeper: &mut *keeper,
                txout: store,
                constants: &constants,
                height: 10,
            };
            let msg = MsgObservedTxIn {
                txs: vec![observed_tx.clone()],
                signer: NodeAddress::new(&format!("rune1node{n}")),
            };
            let result = handle_observed_tx_in(&mut ctx, msg);
            assert!(result.is_ok(), "{}", result.log);
        }
    }

    #[test]
    fn test_consensus_executes_stake() {
        let mut keeper = seeded_keeper();
        let store = TxOutStore::new();
        let observed_tx = observed(
            "stake:BNB.BNB",
            vec![
                Coin::rune(100 * ONE),
                Coin::new(Asset::new(Chain::Bnb, "BNB"), 100 * ONE),
            ],
        );
        deliver(&mut keeper, &store, observed_tx);

        let pool = keeper.get_pool(&Asset::new(Chain::Bnb, "BNB")).unwrap();
        assert_eq!(pool.balance_rune, 100 * ONE);
        assert_eq!(pool.balance_asset, 100 * ONE);
        // vault was credited
        let vault = keeper.get_vault(&PubKey::new("asgard-pk")).unwrap();
        assert_eq!(
            vault.amount_of(&Asset::new(Chain::Bnb, "BNB")),
            10_100 * ONE
        );
    }

    #[test]
    fn test_consensus_enqueues_swap() {
        let mut keeper = seeded_keeper();
        let store = TxOutStore::new();
        let observed_tx = observed(
            "swap:RUNE",
            vec![Coin::new(Asset::new(Chain::Bnb, "BNB"), 5 * ONE)],
        );
        deliver(&mut keeper, &store, observed_tx);
        assert_eq!(keeper.get_swap_queue().unwrap().len(), 1);
    }

    #[test]
    fn test_bad_memo_refunds() {
        let mut keeper = seeded_keeper();
        // a pool so the refund fee can be valued
        let mut pool = shared_types::Pool::new(Asset::new(Chain::Bnb, "BNB"));
        pool.balance_rune = 100 * ONE;
        pool.balance_asset = 100 * ONE;
        keeper.set_pool(1, &pool).unwrap();

        let mut store = TxOutStore::new();
        store.new_block(10);
        let observed_tx = observed(
            "take-my-money",
            vec![Coin::new(Asset::new(Chain::Bnb, "BNB"), 5 * ONE)],
        );
        deliver(&mut keeper, &store, observed_tx);

        let items = store.get_outbound_items(&keeper).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].memo.starts_with("REFUND:"));
        assert_eq!(items[0].to_address, Address::new("bnb1sender"));
    }

    #[test]
    fn test_outbound_observation_seals_item_and_completes_event() {
        let mut keeper = seeded_keeper();
        let mut pool = shared_types::Pool::new(Asset::new(Chain::Bnb, "BNB"));
        pool.balance_rune = 100 * ONE;
        pool.balance_asset = 100 * ONE;
        keeper.set_pool(1, &pool).unwrap();

        let mut store = TxOutStore::new();
        store.new_block(10);
        // an inbound swap whose outbound is scheduled
        let in_hash = TxId::from_hash(b"inbound-swap");
        let mut voter = keeper.get_observed_tx_voter(&in_hash).unwrap();
        voter.height = 9;
        keeper.set_observed_tx_voter(&voter).unwrap();
        let mut event_in = Tx::default();
        event_in.id = in_hash.clone();
        keeper
            .add_incomplete_event(shared_types::Event::new(
                "swap",
                9,
                event_in,
                serde_json::json!({}),
                EventStatus::Pending,
            ))
            .unwrap();
        let toi = shared_types::TxOutItem::new(
            Chain::Bnb,
            Address::new("bnb1dest"),
            Coin::new(Asset::new(Chain::Bnb, "BNB"), 5 * ONE),
            in_hash.clone(),
        );
        store
            .try_add_tx_out_item(&mut keeper, &Constants::default(), toi)
            .unwrap();

        // now the outbound is witnessed
        let scheduled = store.get_outbound_items(&keeper).unwrap();
        let out_tx = Tx::new(
            TxId::from_hash(b"outbound"),
            Chain::Bnb,
            PubKey::new("asgard-pk").address(Chain::Bnb),
            Address::new("bnb1dest"),
            vec![scheduled[0].coin.clone()].into(),
            Gas::default(),
            &format!("OUTBOUND:{in_hash}"),
        );
        let observed_out = ObservedTx::new(out_tx, 905, PubKey::new("asgard-pk"));
        let constants = Constants::default();
        for n in 0..3 {
            let mut ctx = HandlerCtx {
                keeper: &mut keeper,
                txout: &store,
                constants: &constants,
                height: 12,
            };
            let msg = MsgObservedTxOut {
                txs: vec![observed_out.clone()],
                signer: NodeAddress::new(&format!("rune1node{n}")),
            };
            let result = handle_observed_tx_out(&mut ctx, msg);
            assert!(result.is_ok(), "{}", result.log);
        }

        // item sealed
        let batch = keeper.get_txout(10).unwrap();
        assert_eq!(batch.tx_array[0].out_hash, TxId::from_hash(b"outbound"));
        // event completed
        assert!(keeper.get_incomplete_events().unwrap().is_empty());
        assert_eq!(keeper.get_last_signed_height().unwrap(), 10);
        // voter done
        let voter = keeper.get_observed_tx_voter(&in_hash).unwrap();
        assert!(voter.is_done());
    }

    #[test]
    fn test_replayed_witness_is_idempotent() {
        let mut keeper = seeded_keeper();
        let store = TxOutStore::new();
        let observed_tx = observed(
            "stake:BNB.BNB",
            vec![
                Coin::rune(100 * ONE),
                Coin::new(Asset::new(Chain::Bnb, "BNB"), 100 * ONE),
            ],
        );
        deliver(&mut keeper, &store, observed_tx.clone());
        let pool_after = keeper.get_pool(&Asset::new(Chain::Bnb, "BNB")).unwrap();

        // node0 replays its witness: nothing changes
        let constants = Constants::default();
        let mut ctx = HandlerCtx {
            keeper: &mut keeper,
            txout: &store,
            constants: &constants,
            height: 11,
        };
        let result = handle_observed_tx_in(
            &mut ctx,
            MsgObservedTxIn {
                txs: vec![observed_tx],
                signer: NodeAddress::new("rune1node0"),
            },
        );
        assert!(result.is_ok());
        assert_eq!(
            keeper.get_pool(&Asset::new(Chain::Bnb, "BNB")).unwrap(),
            pool_after
        );
    }
}

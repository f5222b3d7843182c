//! Message routing.
//!
//! `Router::handle` is the single entry point the host runtime delivers
//! messages to. It resolves the active version once, runs the message
//! class's validation, and dispatches to the matching handler.

use crate::handlers;
use crate::messages::Msg;
use crate::result::{HandlerResult, ResultCode};
use rc_02_keeper::Keeper;
use rc_06_txout::TxOutStore;
use shared_types::{Constants, NodeAddress, NodeStatus, Version};
use tracing::debug;

/// The version every V1 handler requires.
pub const V1: Version = Version {
    major: 0,
    minor: 1,
    patch: 0,
};

/// Everything a handler needs for one message.
pub struct HandlerCtx<'a> {
    /// State access.
    pub keeper: &'a mut Keeper,
    /// Outbound scheduling for the current block.
    pub txout: &'a TxOutStore,
    /// Network constants (mimir overrides applied at read sites).
    pub constants: &'a Constants,
    /// The native block height being executed.
    pub height: u64,
}

/// Signer authority required by a message class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Authority {
    /// Any node in the active signing set.
    ActiveNode,
    /// An active node or a registered observer.
    Observer,
    /// The node account named by the signer itself, in any status.
    Oneself,
}

/// Dispatches messages to handlers.
pub struct Router;

impl Router {
    /// Validate and execute one message.
    pub fn handle(ctx: &mut HandlerCtx, msg: Msg) -> HandlerResult {
        let version = match ctx.keeper.get_min_active_version() {
            Ok(version) => version,
            Err(e) => return HandlerResult::error(ResultCode::Internal, e.to_string()),
        };
        if version < V1 {
            return HandlerResult::error(
                ResultCode::BadVersion,
                format!("version {version} is not supported"),
            );
        }
        debug!(msg = msg.name(), signer = %msg.signer(), "handling message");

        if let Err(result) = Self::check_authority(ctx, &msg) {
            return result;
        }

        match msg {
            Msg::SetStakeData(m) => handlers::liquidity::handle_stake(ctx, m),
            Msg::SetUnStake(m) => handlers::liquidity::handle_unstake(ctx, m),
            Msg::Add(m) => handlers::liquidity::handle_add(ctx, m),
            Msg::ReserveContributor(m) => handlers::liquidity::handle_reserve(ctx, m),
            Msg::Swap(m) => handlers::swap::handle_swap(ctx, m),
            Msg::ObservedTxIn(m) => handlers::observed::handle_observed_tx_in(ctx, m),
            Msg::ObservedTxOut(m) => handlers::observed::handle_observed_tx_out(ctx, m),
            Msg::ErrataTx(m) => handlers::observed::handle_errata_tx(ctx, m),
            Msg::Bond(m) => handlers::node_ops::handle_bond(ctx, m),
            Msg::Leave(m) => handlers::node_ops::handle_leave(ctx, m),
            Msg::SetNodeKeys(m) => handlers::node_ops::handle_set_node_keys(ctx, m),
            Msg::SetVersion(m) => handlers::node_ops::handle_set_version(ctx, m),
            Msg::Ban(m) => handlers::node_ops::handle_ban(ctx, m),
            Msg::OutboundTx(m) => handlers::vault_ops::handle_outbound_tx(ctx, m),
            Msg::Migrate(m) => handlers::vault_ops::handle_migrate(ctx, m),
            Msg::Ragnarok(m) => handlers::vault_ops::handle_ragnarok(ctx, m),
            Msg::Yggdrasil(m) => handlers::vault_ops::handle_yggdrasil(ctx, m),
            Msg::TssPool(m) => handlers::vault_ops::handle_tss_pool(ctx, m),
            Msg::TssKeysignFail(m) => handlers::vault_ops::handle_tss_keysign_fail(ctx, m),
            Msg::Mimir(m) => handlers::admin::handle_mimir(ctx, m),
            Msg::NoOp(m) => handlers::admin::handle_noop(ctx, m),
        }
    }

    fn check_authority(ctx: &HandlerCtx, msg: &Msg) -> Result<(), HandlerResult> {
        let authority = match msg {
            Msg::ObservedTxIn(_) | Msg::ObservedTxOut(_) => Authority::Observer,
            Msg::SetNodeKeys(_) | Msg::SetVersion(_) => Authority::Oneself,
            _ => Authority::ActiveNode,
        };
        let signer = msg.signer();
        if signer.is_empty() {
            return Err(HandlerResult::error(
                ResultCode::InvalidAddress,
                "signer cannot be empty",
            ));
        }
        let authorized = match authority {
            Authority::ActiveNode => is_signed_by_active_node(ctx.keeper, signer),
            Authority::Observer => {
                is_signed_by_active_node(ctx.keeper, signer)
                    || ctx.keeper.is_active_observer(signer).unwrap_or(false)
            }
            Authority::Oneself => ctx.keeper.node_account_exists(signer).unwrap_or(false),
        };
        if !authorized {
            return Err(HandlerResult::error(
                ResultCode::Unauthorized,
                format!("{signer} is not authorized"),
            ));
        }
        Ok(())
    }
}

/// Whether the address belongs to an active node account.
pub fn is_signed_by_active_node(keeper: &Keeper, addr: &NodeAddress) -> bool {
    keeper
        .get_node_account(addr)
        .map(|na| na.status == NodeStatus::Active && na.bond > 0)
        .unwrap_or(false)
}

//! # Events
//!
//! Every domain transition emits a tagged event with a JSON payload,
//! persisted for off-chain indexers. Event ids are strictly increasing and
//! contiguous; `Pending` events complete once all their outbound txs have
//! been observed.

use crate::asset::Asset;
use crate::coin::Coins;
use crate::pool::PoolStatus;
use crate::tx::{Tx, TxId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic event identifier.
pub type EventId = u64;

/// Event completion status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    /// Waiting on outbound observations.
    #[default]
    Pending,
    /// Completed normally.
    Success,
    /// The action failed with no refund.
    Failed,
    /// The action failed and the inbound was refunded.
    Refund,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Pending => "pending",
            EventStatus::Success => "success",
            EventStatus::Failed => "failed",
            EventStatus::Refund => "refund",
        };
        write!(f, "{s}")
    }
}

/// The fee charged while scheduling an outbound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Fee {
    /// Coins deducted from the outbound amount.
    pub coins: Coins,
    /// RUNE removed from the pool to balance an asset-side fee.
    pub pool_deduct: u128,
}

/// A persisted event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Event {
    /// Monotonic id, assigned at persistence.
    pub id: EventId,
    /// Payload tag (`swap`, `stake`, `pool`, ...).
    pub event_type: String,
    /// Native block height the event was recorded at.
    pub height: u64,
    /// The inbound tx that caused the transition.
    pub in_tx: Tx,
    /// Outbound txs answering the inbound, filled as observed.
    pub out_txs: Vec<Tx>,
    /// Fee charged on the outbound leg.
    pub fee: Fee,
    /// Completion status.
    pub status: EventStatus,
    /// JSON-encoded typed payload.
    pub event: serde_json::Value,
}

impl Event {
    /// Create an event; the id is assigned by the event manager.
    pub fn new(
        event_type: &str,
        height: u64,
        in_tx: Tx,
        payload: serde_json::Value,
        status: EventStatus,
    ) -> Self {
        Self {
            id: 0,
            event_type: event_type.to_string(),
            height,
            in_tx,
            out_txs: Vec::new(),
            fee: Fee::default(),
            status,
            event: payload,
        }
    }
}

/// A signed per-pool RUNE delta, used by rewards and errata payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAmt {
    /// The pool.
    pub asset: Asset,
    /// The delta; negative for deductions.
    pub amount: i128,
}

/// Swap execution payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSwap {
    /// The pool swapped through.
    pub pool: Asset,
    /// The caller's price floor.
    pub price_target: u128,
    /// Price impact in basis points.
    pub trade_slip: u64,
    /// Fee retained by the pool, in RUNE.
    pub liquidity_fee: u128,
}

impl EventSwap {
    /// Payload tag.
    pub const TYPE: &'static str = "swap";
}

/// Stake payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStake {
    /// The pool staked into.
    pub pool: Asset,
    /// Units granted.
    pub stake_units: u128,
}

impl EventStake {
    /// Payload tag.
    pub const TYPE: &'static str = "stake";
}

/// Unstake payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUnstake {
    /// The pool unstaked from.
    pub pool: Asset,
    /// Units burned.
    pub stake_units: u128,
    /// Requested withdrawal fraction in basis points.
    pub basis_points: u64,
    /// Asymmetric-withdrawal indicator; always zero.
    pub asymmetry: i64,
}

impl EventUnstake {
    /// Payload tag.
    pub const TYPE: &'static str = "unstake";
}

/// Donation payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAdd {
    /// The pool donated to.
    pub pool: Asset,
}

impl EventAdd {
    /// Payload tag.
    pub const TYPE: &'static str = "add";
}

/// Pool status-change payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPool {
    /// The pool.
    pub pool: Asset,
    /// New status.
    pub status: PoolStatus,
}

impl EventPool {
    /// Payload tag.
    pub const TYPE: &'static str = "pool";
}

/// Block-reward distribution payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRewards {
    /// RUNE credited to the bond-reward accumulator.
    pub bond_reward: u128,
    /// Per-pool RUNE deltas.
    pub pool_rewards: Vec<PoolAmt>,
}

impl EventRewards {
    /// Payload tag.
    pub const TYPE: &'static str = "rewards";
}

/// Refund payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRefund {
    /// Rejection code of the failed action.
    pub code: u32,
    /// Human-readable reason.
    pub reason: String,
}

impl EventRefund {
    /// Payload tag.
    pub const TYPE: &'static str = "refund";
}

/// Operator-override payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAdminConfig {
    /// Override key.
    pub key: String,
    /// Override value.
    pub value: String,
}

impl EventAdminConfig {
    /// Payload tag.
    pub const TYPE: &'static str = "admin-config";
}

/// One pool correction within an errata payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMod {
    /// The pool corrected.
    pub asset: Asset,
    /// RUNE delta magnitude.
    pub rune_amt: u128,
    /// Whether RUNE was added (false = removed).
    pub rune_add: bool,
    /// Asset delta magnitude.
    pub asset_amt: u128,
    /// Whether asset was added (false = removed).
    pub asset_add: bool,
}

/// Errata payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventErrata {
    /// Pool corrections applied.
    pub pools: Vec<PoolMod>,
}

impl EventErrata {
    /// Payload tag.
    pub const TYPE: &'static str = "errata";
}

/// Gas reimbursement payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventGas {
    /// The gas asset consumed.
    pub asset: Asset,
    /// Asset amount consumed from the vault.
    pub asset_amt: u128,
    /// RUNE credited back to the pool.
    pub rune_amt: u128,
    /// Number of outbound txs the gas covered.
    pub transaction_count: u64,
}

impl EventGas {
    /// Payload tag.
    pub const TYPE: &'static str = "gas";
}

/// Bond change payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBond {
    /// RUNE amount bonded or returned.
    pub amount: u128,
    /// `bond_paid` or `bond_returned`.
    pub bond_type: String,
}

impl EventBond {
    /// Payload tag.
    pub const TYPE: &'static str = "bond";
}

/// Slash payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSlash {
    /// The pool the slash settled against, when applicable.
    pub pool: Asset,
    /// Slashed amounts.
    pub slash_amount: Vec<PoolAmt>,
}

impl EventSlash {
    /// Payload tag.
    pub const TYPE: &'static str = "slash";
}

/// Fee payload, emitted when an outbound fee is deducted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFee {
    /// The inbound tx the fee belongs to.
    pub tx_id: TxId,
    /// The deduction.
    pub fee: Fee,
}

impl EventFee {
    /// Payload tag.
    pub const TYPE: &'static str = "fee";
}

/// Outbound completion payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutbound {
    /// The inbound tx answered.
    pub in_tx_id: TxId,
    /// The outbound tx observed.
    pub tx: Tx,
}

impl EventOutbound {
    /// Payload tag.
    pub const TYPE: &'static str = "outbound";
}

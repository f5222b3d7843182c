//! # Domain messages
//!
//! The typed records delivered by the host consensus engine. Every
//! message carries the signer that submitted it; authority checks live in
//! the router's validation step.

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, Asset, Chain, Coins, NodeAddress, ObservedTx, PubKey, Tx, TxId, Version,
};

/// Provide liquidity to a pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetStakeData {
    /// The pool asset.
    pub asset: Asset,
    /// RUNE side of the deposit.
    pub rune_amount: u128,
    /// Asset side of the deposit.
    pub asset_amount: u128,
    /// The staker's native address.
    pub rune_address: Address,
    /// The staker's address on the asset chain.
    pub asset_address: Address,
    /// The inbound tx that carried the deposit.
    pub tx: Tx,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Withdraw liquidity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetUnStake {
    /// The pool asset.
    pub asset: Asset,
    /// Withdrawal fraction in basis points.
    pub basis_points: u64,
    /// The staker's native address.
    pub rune_address: Address,
    /// The inbound tx that requested the withdrawal.
    pub tx: Tx,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Exchange one asset for another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSwap {
    /// The inbound tx carrying the source coin.
    pub tx: Tx,
    /// Target asset.
    pub target_asset: Asset,
    /// Output destination; empty means back to the sender.
    pub destination: Address,
    /// Minimum acceptable output.
    pub trade_target: u128,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Donate coins to a pool without receiving units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAdd {
    /// The pool asset.
    pub asset: Asset,
    /// RUNE side of the donation.
    pub rune_amount: u128,
    /// Asset side of the donation.
    pub asset_amount: u128,
    /// The inbound tx.
    pub tx: Tx,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Finalize an outbound transaction that was observed leaving a vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgOutboundTx {
    /// The witnessed outbound.
    pub tx: ObservedTx,
    /// The inbound tx the outbound answers.
    pub in_tx_id: TxId,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Seal a vault-to-vault migration observed on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMigrate {
    /// The witnessed migration transfer.
    pub tx: ObservedTx,
    /// Height the migration was scheduled at.
    pub block_height: u64,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Seal a teardown refund observed on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRagnarok {
    /// The witnessed refund transfer.
    pub tx: ObservedTx,
    /// Height the teardown round was scheduled at.
    pub block_height: u64,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Credit or drain a yggdrasil vault after an observed transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgYggdrasil {
    /// The yggdrasil vault key.
    pub pub_key: PubKey,
    /// True for funding, false for a return to asgard.
    pub add_funds: bool,
    /// The coins moved.
    pub coins: Coins,
    /// The witnessed transfer.
    pub tx: Tx,
    /// Height the transfer was scheduled at.
    pub block_height: u64,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Contribute RUNE to the protocol reserve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgReserveContributor {
    /// Contributor address.
    pub contributor: Address,
    /// RUNE contributed.
    pub amount: u128,
    /// The inbound tx.
    pub tx: Tx,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Bond RUNE to a node account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBond {
    /// The node being bonded.
    pub node_address: NodeAddress,
    /// RUNE bonded.
    pub bond: u128,
    /// Address the bond came from (and is refunded to).
    pub bond_address: Address,
    /// The inbound tx.
    pub tx: Tx,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Request a voluntary exit from the validator set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLeave {
    /// The inbound tx; its sender must be the node's bond address.
    pub tx: Tx,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Register or rotate a node's keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetNodeKeys {
    /// Key the node signs witnesses with.
    pub node_pub_key: PubKey,
    /// Consensus-engine key.
    pub validator_cons_pub_key: PubKey,
    /// Submitting node (also the account updated).
    pub signer: NodeAddress,
}

/// Report the node's software version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetVersion {
    /// The reported version.
    pub version: Version,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Witnesses for transactions entering vaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgObservedTxIn {
    /// The witnessed transactions.
    pub txs: Vec<ObservedTx>,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Witnesses for transactions leaving vaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgObservedTxOut {
    /// The witnessed transactions.
    pub txs: Vec<ObservedTx>,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Vote to retroactively reverse an observed tx.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgErrataTx {
    /// The disputed tx.
    pub tx_id: TxId,
    /// The chain it happened on.
    pub chain: Chain,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Report a keygen ceremony result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTssPool {
    /// Ceremony identifier.
    pub id: String,
    /// The produced pool key; empty on failure.
    pub pool_pub_key: PubKey,
    /// Ceremony member keys.
    pub pub_keys: Vec<PubKey>,
    /// Nodes blamed for a failure; empty on success.
    pub blame: Vec<NodeAddress>,
    /// Foreign height of the ceremony.
    pub height: u64,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Report a keysign failure with its blame list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTssKeysignFail {
    /// Failure identifier.
    pub id: String,
    /// Nodes blamed.
    pub blame: Vec<NodeAddress>,
    /// The outbound that failed to sign.
    pub memo: String,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Operator override of a network constant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMimir {
    /// Constant name.
    pub key: String,
    /// Override value.
    pub value: i64,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Vote to ban a misbehaving node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBan {
    /// The node to ban.
    pub node_address: NodeAddress,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// Explicit no-op.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgNoOp {
    /// The witnessed tx, if any.
    pub tx: Tx,
    /// Submitting node.
    pub signer: NodeAddress,
}

/// The closed message set the router dispatches on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::large_enum_variant)]
pub enum Msg {
    /// Provide liquidity.
    SetStakeData(MsgSetStakeData),
    /// Withdraw liquidity.
    SetUnStake(MsgSetUnStake),
    /// Exchange assets.
    Swap(MsgSwap),
    /// Donate to a pool.
    Add(MsgAdd),
    /// Finalize an outbound.
    OutboundTx(MsgOutboundTx),
    /// Seal a migration.
    Migrate(MsgMigrate),
    /// Seal a teardown refund.
    Ragnarok(MsgRagnarok),
    /// Credit or drain a yggdrasil vault.
    Yggdrasil(MsgYggdrasil),
    /// Contribute to the reserve.
    ReserveContributor(MsgReserveContributor),
    /// Bond to a node.
    Bond(MsgBond),
    /// Request exit.
    Leave(MsgLeave),
    /// Register keys.
    SetNodeKeys(MsgSetNodeKeys),
    /// Report a version.
    SetVersion(MsgSetVersion),
    /// Inbound witnesses.
    ObservedTxIn(MsgObservedTxIn),
    /// Outbound witnesses.
    ObservedTxOut(MsgObservedTxOut),
    /// Errata vote.
    ErrataTx(MsgErrataTx),
    /// Keygen result.
    TssPool(MsgTssPool),
    /// Keysign failure.
    TssKeysignFail(MsgTssKeysignFail),
    /// Operator override.
    Mimir(MsgMimir),
    /// Ban vote.
    Ban(MsgBan),
    /// No-op.
    NoOp(MsgNoOp),
}

impl Msg {
    /// The signer that submitted the message.
    pub fn signer(&self) -> &NodeAddress {
        match self {
            Msg::SetStakeData(m) => &m.signer,
            Msg::SetUnStake(m) => &m.signer,
            Msg::Swap(m) => &m.signer,
            Msg::Add(m) => &m.signer,
            Msg::OutboundTx(m) => &m.signer,
            Msg::Migrate(m) => &m.signer,
            Msg::Ragnarok(m) => &m.signer,
            Msg::Yggdrasil(m) => &m.signer,
            Msg::ReserveContributor(m) => &m.signer,
            Msg::Bond(m) => &m.signer,
            Msg::Leave(m) => &m.signer,
            Msg::SetNodeKeys(m) => &m.signer,
            Msg::SetVersion(m) => &m.signer,
            Msg::ObservedTxIn(m) => &m.signer,
            Msg::ObservedTxOut(m) => &m.signer,
            Msg::ErrataTx(m) => &m.signer,
            Msg::TssPool(m) => &m.signer,
            Msg::TssKeysignFail(m) => &m.signer,
            Msg::Mimir(m) => &m.signer,
            Msg::Ban(m) => &m.signer,
            Msg::NoOp(m) => &m.signer,
        }
    }

    /// A short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Msg::SetStakeData(_) => "set_stake_data",
            Msg::SetUnStake(_) => "set_unstake",
            Msg::Swap(_) => "swap",
            Msg::Add(_) => "add",
            Msg::OutboundTx(_) => "outbound_tx",
            Msg::Migrate(_) => "migrate",
            Msg::Ragnarok(_) => "ragnarok",
            Msg::Yggdrasil(_) => "yggdrasil",
            Msg::ReserveContributor(_) => "reserve_contributor",
            Msg::Bond(_) => "bond",
            Msg::Leave(_) => "leave",
            Msg::SetNodeKeys(_) => "set_node_keys",
            Msg::SetVersion(_) => "set_version",
            Msg::ObservedTxIn(_) => "observed_tx_in",
            Msg::ObservedTxOut(_) => "observed_tx_out",
            Msg::ErrataTx(_) => "errata_tx",
            Msg::TssPool(_) => "tss_pool",
            Msg::TssKeysignFail(_) => "tss_keysign_fail",
            Msg::Mimir(_) => "mimir",
            Msg::Ban(_) => "ban",
            Msg::NoOp(_) => "noop",
        }
    }
}

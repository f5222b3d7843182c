//! Demo binary: runs the state machine over a scripted block feed so the
//! whole pipeline (witness consensus, stake, swap queue, rewards,
//! outbound batching) can be watched in the logs.

use anyhow::Result;
use node_runtime::{GenesisConfig, RuneNode};
use rc_10_handlers::messages::MsgObservedTxIn;
use rc_10_handlers::Msg;
use shared_types::{
    Address, Asset, Chain, Coin, Constants, Gas, NodeAddress, ObservedTx, PubKey, Tx, TxId,
    Version, ONE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn genesis() -> GenesisConfig {
    GenesisConfig {
        nodes: (0..4)
            .map(|n| node_runtime::genesis::GenesisNode {
                node_address: NodeAddress::new(&format!("rune1node{n}")),
                node_pub_key: PubKey::new(&format!("node-pk-{n}")),
                validator_cons_pub_key: PubKey::new(&format!("cons-pk-{n}")),
                bond: 100_000 * ONE,
                bond_address: Address::new(&format!("rune1bond{n}")),
            })
            .collect(),
        asgard_pub_key: PubKey::new("asgard-genesis"),
        reserve: 22_000_000 * ONE,
        version: Version::new(0, 1, 0),
    }
}

fn witness(memo: &str, coins: Vec<Coin>, foreign_height: u64) -> ObservedTx {
    let tx = Tx::new(
        TxId::from_hash(memo.as_bytes()),
        Chain::Bnb,
        Address::new("bnb1user"),
        Address::new("bnb1vaultaddr"),
        coins.into(),
        Gas::default(),
        memo,
    );
    ObservedTx::new(tx, foreign_height, PubKey::new("asgard-genesis"))
}

fn broadcast(node: &mut RuneNode, observed: ObservedTx) {
    for n in 0..4 {
        let result = node.deliver_msg(Msg::ObservedTxIn(MsgObservedTxIn {
            txs: vec![observed.clone()],
            signer: NodeAddress::new(&format!("rune1node{n}")),
        }));
        if !result.is_ok() {
            info!(code = ?result.code, log = %result.log, "message rejected");
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut node = RuneNode::new(Constants::default());
    node.init_chain(&genesis())?;
    info!("chain initialized");

    // block 1: a staker opens the BNB pool
    node.begin_block(1)?;
    broadcast(
        &mut node,
        witness(
            "stake:BNB.BNB",
            vec![
                Coin::rune(10_000 * ONE),
                Coin::new(Asset::new(Chain::Bnb, "BNB"), 10_000 * ONE),
            ],
            5_000_001,
        ),
    );
    node.end_block()?;

    // block 2: a trader swaps BNB for RUNE
    node.begin_block(2)?;
    broadcast(
        &mut node,
        witness(
            "swap:RUNE:rune1trader",
            vec![Coin::new(Asset::new(Chain::Bnb, "BNB"), 50 * ONE)],
            5_000_002,
        ),
    );
    let (_, batch) = node.end_block()?;
    for item in &batch.tx_array {
        info!(chain = %item.chain, coin = %item.coin, to = %item.to_address, "outbound scheduled");
    }

    let pool = node.keeper().get_pool(&Asset::new(Chain::Bnb, "BNB"))?;
    info!(
        rune = pool.balance_rune,
        asset = pool.balance_asset,
        units = pool.pool_units,
        "final pool state"
    );
    let data = node.keeper().get_vault_data()?;
    info!(
        reserve = data.total_reserve,
        bond_reward = data.bond_reward_rune,
        "final accumulator"
    );
    Ok(())
}

//! Cross-subsystem scenarios.

use crate::harness::{TestNet, ASGARD};
use rc_02_keeper::{Keeper, MemoryStore};
use rc_03_amm::swap;
use rc_10_handlers::messages::{MsgErrataTx, MsgMigrate, MsgObservedTxIn};
use rc_10_handlers::Msg;
use shared_types::{
    Address, Asset, Chain, Coin, Constants, Gas, NodeAddress, ObservedTx, Pool, PubKey,
    Staker, Tx, TxId, VaultData, ONE, U256,
};

fn bnb() -> Asset {
    Asset::new(Chain::Bnb, "BNB")
}

fn btc() -> Asset {
    Asset::new(Chain::Btc, "BTC")
}

fn fresh_keeper() -> Keeper {
    Keeper::new(Box::new(MemoryStore::new()))
}

fn seed_pool(keeper: &mut Keeper, asset: Asset, rune: u128, depth: u128) {
    let mut pool = Pool::new(asset);
    pool.balance_rune = rune;
    pool.balance_asset = depth;
    pool.pool_units = rune;
    keeper.set_pool(1, &pool).unwrap();
}

fn rune_inbound(amount: u128, memo: &str) -> Tx {
    Tx::new(
        TxId::from_hash(memo.as_bytes()),
        Chain::Bnb,
        Address::new("bnb1trader"),
        Address::new("bnb1vaultaddr"),
        vec![Coin::rune(amount)].into(),
        Gas::default(),
        memo,
    )
}

/// S1: pool {R=100, A=100}, 5 RUNE in, trade target 0, fee 1e6.
#[test]
fn s1_single_swap_exact_emission() {
    let mut keeper = fresh_keeper();
    seed_pool(&mut keeper, bnb(), 100 * ONE, 100 * ONE);

    let emitted = swap(
        &mut keeper,
        2,
        &rune_inbound(5 * ONE, "swap:BNB.BNB"),
        bnb(),
        Address::new("bnb1trader"),
        0,
        1_000_000,
    )
    .unwrap();

    assert_eq!(emitted, 453_514_739);
    let pool = keeper.get_pool(&bnb()).unwrap();
    assert_eq!(pool.balance_rune, 105 * ONE);
    assert_eq!(pool.balance_asset, 100 * ONE - 453_514_739);
}

/// S2: BTC -> RUNE -> BNB double swap publishes two swap events.
#[test]
fn s2_double_swap_two_events() {
    let mut keeper = fresh_keeper();
    seed_pool(&mut keeper, bnb(), 100 * ONE, 100 * ONE);
    seed_pool(&mut keeper, btc(), 2_349_500_000, 334_850_000);

    let tx = Tx::new(
        TxId::from_hash(b"double-swap"),
        Chain::Btc,
        Address::new("bc1trader"),
        Address::new("bc1vaultaddr"),
        vec![Coin::new(btc(), 20_000_000)].into(),
        Gas::default(),
        "swap:BNB.BNB",
    );
    let emitted = swap(
        &mut keeper,
        2,
        &tx,
        bnb(),
        Address::new("bnb1trader"),
        0,
        1_000_000,
    )
    .unwrap();

    assert!(emitted > 0);
    let events = keeper.get_incomplete_events().unwrap();
    let swaps = events.iter().filter(|e| e.event_type == "swap").count();
    assert_eq!(swaps, 2);
}

/// S3: 4 active nodes; two witnesses leave the voter pending, the third
/// reaches supermajority and the stake memo executes.
#[test]
fn s3_observer_consensus_then_stake() {
    let mut net = TestNet::new(4);
    net.node.begin_block(1).unwrap();

    let observed = net.inbound(
        "bnb1staker",
        "stake:BNB.BNB",
        vec![Coin::rune(50 * ONE), Coin::new(bnb(), 50 * ONE)],
    );
    let tx_id = observed.tx.id.clone();

    for n in 0..2 {
        let result = net.node.deliver_msg(Msg::ObservedTxIn(MsgObservedTxIn {
            txs: vec![observed.clone()],
            signer: net.signer(n),
        }));
        assert!(result.is_ok(), "{}", result.log);
        let voter = net.node.keeper().get_observed_tx_voter(&tx_id).unwrap();
        assert_eq!(voter.height, 0, "no consensus with {} signers", n + 1);
        assert!(net.node.keeper().get_pool(&bnb()).unwrap().is_empty());
    }

    // ceil(8/3) = 3: the third witness forms consensus
    let result = net.node.deliver_msg(Msg::ObservedTxIn(MsgObservedTxIn {
        txs: vec![observed],
        signer: net.signer(2),
    }));
    assert!(result.is_ok(), "{}", result.log);
    let voter = net.node.keeper().get_observed_tx_voter(&tx_id).unwrap();
    assert_eq!(voter.height, 1);
    let pool = net.node.keeper().get_pool(&bnb()).unwrap();
    assert_eq!(pool.balance_rune, 50 * ONE);
    assert_eq!(pool.balance_asset, 50 * ONE);
}

/// S4: errata on a 30 RUNE stake reverses the pool and burns the staker's
/// 800 units.
#[test]
fn s4_errata_reverses_stake() {
    let mut net = TestNet::new(4);
    net.node.begin_block(1).unwrap();

    // seed the disputed state directly: pool {100, 100, 1600} where the
    // malicious staker owns 800 units from a 30 RUNE deposit
    let keeper = net.node.keeper_mut();
    let mut pool = Pool::new(bnb());
    pool.balance_rune = 100 * ONE;
    pool.balance_asset = 100 * ONE;
    pool.pool_units = 1_600;
    keeper.set_pool(1, &pool).unwrap();
    let mut staker = Staker::new(bnb(), Address::new("bnb1malicious"));
    staker.units = 800;
    keeper.set_staker(&staker).unwrap();

    let disputed = Tx::new(
        TxId::from_hash(b"disputed-stake"),
        Chain::Bnb,
        Address::new("bnb1malicious"),
        Address::new("bnb1vaultaddr"),
        vec![Coin::rune(30 * ONE)].into(),
        Gas::default(),
        "stake:BNB.BNB",
    );
    let mut voter = keeper.get_observed_tx_voter(&disputed.id).unwrap();
    voter.height = 1;
    voter
        .txs
        .push(ObservedTx::new(disputed.clone(), 77, PubKey::new(ASGARD)));
    keeper.set_observed_tx_voter(&voter).unwrap();

    for n in 0..3 {
        let result = net.node.deliver_msg(Msg::ErrataTx(MsgErrataTx {
            tx_id: disputed.id.clone(),
            chain: Chain::Bnb,
            signer: net.signer(n),
        }));
        assert!(result.is_ok(), "{}", result.log);
    }

    let pool = net.node.keeper().get_pool(&bnb()).unwrap();
    assert_eq!(pool.balance_rune, 70 * ONE);
    assert_eq!(pool.balance_asset, 100 * ONE);
    assert_eq!(pool.pool_units, 800);
    let staker = net
        .node
        .keeper()
        .get_staker(&bnb(), &Address::new("bnb1malicious"))
        .unwrap();
    assert_eq!(staker.units, 0);
}

/// S6: reserve 100, staked 1000, bonded 2000: stakers get a third of the
/// block reward, bonders two thirds.
#[test]
fn s6_reward_split() {
    let mut keeper = fresh_keeper();
    seed_pool(&mut keeper, bnb(), 1_000 * ONE, 1_000 * ONE);
    let na = shared_types::NodeAccount::new(
        NodeAddress::new("rune1bonder"),
        shared_types::NodeStatus::Active,
        shared_types::NodePubKeys::default(),
        2_000 * ONE,
        Address::new("rune1bond"),
        1,
    );
    keeper.set_node_account(&na).unwrap();
    let mut data = VaultData::new();
    data.total_reserve = 100 * ONE;
    keeper.set_vault_data(&data).unwrap();

    rc_08_rewards::update_vault_data(&mut keeper, &Constants::default(), 5).unwrap();

    let block_reward = 100 * ONE / 6 / 6_311_390;
    let staker_share = block_reward * (2_000 - 1_000) / (2_000 + 1_000);
    let bonder_share = block_reward - staker_share;

    let after = keeper.get_vault_data().unwrap();
    assert_eq!(after.total_reserve, 100 * ONE - block_reward);
    assert_eq!(after.bond_reward_rune, bonder_share);
    assert_eq!(
        keeper.get_pool(&bnb()).unwrap().balance_rune,
        1_000 * ONE + staker_share
    );
}

/// Invariant 1+2: the sum of staker units always equals pool units, and
/// a zero-RUNE pool has zero units.
#[test]
fn invariant_units_conserved_across_stakes_and_unstakes() {
    let mut net = TestNet::new(4);
    // an empty reserve keeps block rewards out of the arithmetic
    net.node
        .keeper_mut()
        .set_vault_data(&VaultData::new())
        .unwrap();
    net.node.begin_block(1).unwrap();

    for (i, (r, a)) in [(100, 100), (35, 70), (250, 10)].iter().enumerate() {
        let observed = net.inbound(
            &format!("bnb1staker{i}"),
            "stake:BNB.BNB",
            vec![Coin::rune(r * ONE), Coin::new(bnb(), a * ONE)],
        );
        for result in net.broadcast_in(observed) {
            assert!(result.is_ok(), "{}", result.log);
        }
    }
    net.node.end_block().unwrap();

    let keeper = net.node.keeper();
    let pool = keeper.get_pool(&bnb()).unwrap();
    let total: u128 = keeper
        .get_stakers(&bnb())
        .unwrap()
        .iter()
        .map(|s| s.units)
        .sum();
    assert_eq!(pool.pool_units, total);
    assert!(pool.balance_rune > 0 && pool.pool_units > 0);

    // everyone withdraws in full
    net.node.begin_block(2).unwrap();
    for i in 0..3 {
        let observed = net.inbound(
            &format!("bnb1staker{i}"),
            "withdraw:BNB.BNB:10000",
            vec![Coin::rune(1)],
        );
        for result in net.broadcast_in(observed) {
            assert!(result.is_ok(), "{}", result.log);
        }
    }
    net.node.end_block().unwrap();

    let pool = net.node.keeper().get_pool(&bnb()).unwrap();
    assert_eq!(pool.pool_units, 0);
    assert_eq!(pool.balance_rune, 0);
    assert!(net.node.keeper().get_stakers(&bnb()).unwrap().is_empty());
}

/// Invariant 3: a completed swap preserves the constant product up to the
/// liquidity fee.
#[test]
fn invariant_constant_product() {
    let mut keeper = fresh_keeper();
    seed_pool(&mut keeper, bnb(), 137 * ONE, 59 * ONE);
    let before = keeper.get_pool(&bnb()).unwrap();

    swap(
        &mut keeper,
        2,
        &rune_inbound(7 * ONE, "swap:BNB.BNB"),
        bnb(),
        Address::new("bnb1trader"),
        0,
        1_000_000,
    )
    .unwrap();

    let after = keeper.get_pool(&bnb()).unwrap();
    let product_before = U256::from(before.balance_rune) * U256::from(before.balance_asset);
    let product_after = U256::from(after.balance_rune) * U256::from(after.balance_asset);
    // the fee stays in the pool, so the product can only grow
    assert!(product_after >= product_before);
}

/// Invariant 6: event ids are strictly increasing and contiguous.
#[test]
fn invariant_event_ids_contiguous() {
    let mut net = TestNet::new(4);
    net.open_pool(&bnb(), 100 * ONE, 100 * ONE);
    net.next_block();
    net.next_block();

    let events = net.node.keeper().get_completed_events().unwrap();
    assert!(!events.is_empty());
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.id, i as u64 + 1, "gap at {}", event.id);
    }
    assert_eq!(
        net.node.keeper().get_last_event_id().unwrap(),
        events.len() as u64
    );
}

/// Idempotence: replaying a witness from the same signer changes nothing,
/// before or after consensus.
#[test]
fn idempotent_witness_replay() {
    let mut net = TestNet::new(4);
    net.node.begin_block(1).unwrap();
    let observed = net.inbound(
        "bnb1staker",
        "stake:BNB.BNB",
        vec![Coin::rune(10 * ONE), Coin::new(bnb(), 10 * ONE)],
    );
    for result in net.broadcast_in(observed.clone()) {
        assert!(result.is_ok());
    }
    let pool_after = net.node.keeper().get_pool(&bnb()).unwrap();
    let voter_after = net
        .node
        .keeper()
        .get_observed_tx_voter(&observed.tx.id)
        .unwrap();

    let result = net.node.deliver_msg(Msg::ObservedTxIn(MsgObservedTxIn {
        txs: vec![observed.clone()],
        signer: net.signer(0),
    }));
    assert!(result.is_ok());
    assert_eq!(net.node.keeper().get_pool(&bnb()).unwrap(), pool_after);
    assert_eq!(
        net.node
            .keeper()
            .get_observed_tx_voter(&observed.tx.id)
            .unwrap()
            .txs,
        voter_after.txs
    );
    assert_eq!(
        net.node
            .keeper()
            .get_observed_tx_voter(&observed.tx.id)
            .unwrap()
            .height,
        voter_after.height
    );
}

/// Idempotence: a migrate whose matching item is already sealed is a
/// no-op with success.
#[test]
fn idempotent_sealed_migrate() {
    let mut net = TestNet::new(4);
    net.node.begin_block(1).unwrap();

    let out_tx = Tx::new(
        TxId::from_hash(b"migrate-transfer"),
        Chain::Bnb,
        Address::new("bnb1oldvault"),
        Address::new("bnb1newvault"),
        vec![Coin::new(bnb(), 10 * ONE)].into(),
        Gas::default(),
        "MIGRATE:1",
    );
    let observed = ObservedTx::new(out_tx, 42, PubKey::new(ASGARD));

    let first = net.node.deliver_msg(Msg::Migrate(MsgMigrate {
        tx: observed.clone(),
        block_height: 1,
        signer: net.signer(0),
    }));
    assert!(first.is_ok(), "{}", first.log);
    let second = net.node.deliver_msg(Msg::Migrate(MsgMigrate {
        tx: observed,
        block_height: 1,
        signer: net.signer(1),
    }));
    assert!(second.is_ok(), "{}", second.log);
}

/// Round trip: stake then unstake in full returns the deposit, minus one
/// transaction fee per outbound leg, within a base unit.
#[test]
fn round_trip_stake_unstake() {
    let mut net = TestNet::new(4);
    // an empty reserve keeps block rewards out of the arithmetic
    net.node
        .keeper_mut()
        .set_vault_data(&VaultData::new())
        .unwrap();
    net.node.begin_block(1).unwrap();
    let observed = net.inbound(
        "bnb1roundtrip",
        "stake:BNB.BNB",
        vec![Coin::rune(100 * ONE), Coin::new(bnb(), 100 * ONE)],
    );
    for result in net.broadcast_in(observed) {
        assert!(result.is_ok(), "{}", result.log);
    }
    net.node.end_block().unwrap();

    net.node.begin_block(2).unwrap();
    let observed = net.inbound("bnb1roundtrip", "withdraw:BNB.BNB:10000", vec![Coin::rune(1)]);
    for result in net.broadcast_in(observed) {
        assert!(result.is_ok(), "{}", result.log);
    }
    let (_, batch) = net.node.end_block().unwrap();

    let fee = Constants::default().transaction_fee;
    let rune_leg = batch
        .tx_array
        .iter()
        .find(|item| item.coin.is_rune())
        .expect("rune leg scheduled");
    assert!(rune_leg.coin.amount.abs_diff(100 * ONE - fee) <= 1);

    let asset_leg = batch
        .tx_array
        .iter()
        .find(|item| item.coin.asset == bnb())
        .expect("asset leg scheduled");
    // asset-side fee is the RUNE fee at the pool ratio; with the pool
    // drained the scheduler priced it against the pre-drain ratio of 1:1
    assert!(asset_leg.coin.amount >= 100 * ONE - 2 * fee);
    assert!(asset_leg.coin.amount <= 100 * ONE);
}

/// Outbound deadline: the full loop closes when the outbound is observed
/// back, and the voter is done.
#[test]
fn outbound_loop_closes() {
    let mut net = TestNet::new(4);
    net.open_pool(&bnb(), 1_000 * ONE, 1_000 * ONE);

    // swap inbound
    let height = net.node.height() + 1;
    net.node.begin_block(height).unwrap();
    let observed = net.inbound(
        "bnb1trader",
        "swap:RUNE:rune1trader",
        vec![Coin::new(bnb(), 10 * ONE)],
    );
    let in_hash = observed.tx.id.clone();
    for result in net.broadcast_in(observed) {
        assert!(result.is_ok(), "{}", result.log);
    }
    let (_, batch) = net.node.end_block().unwrap();
    assert_eq!(batch.tx_array.len(), 1);
    let item = &batch.tx_array[0];

    // the signer broadcasts; observers watch it leave the vault
    let height = net.node.height() + 1;
    net.node.begin_block(height).unwrap();
    let out_tx = Tx::new(
        TxId::from_hash(b"the-outbound"),
        item.chain,
        PubKey::new(ASGARD).address(item.chain),
        item.to_address.clone(),
        vec![item.coin.clone()].into(),
        Gas::default(),
        &format!("OUTBOUND:{in_hash}"),
    );
    for result in net.broadcast_out(ObservedTx::new(out_tx, 6_000_000, PubKey::new(ASGARD))) {
        assert!(result.is_ok(), "{}", result.log);
    }
    net.node.end_block().unwrap();

    let voter = net.node.keeper().get_observed_tx_voter(&in_hash).unwrap();
    assert!(voter.is_done());
    assert!(voter.actions.iter().all(|a| !a.out_hash.is_empty()));
    // no pending events remain for the swap
    assert!(net
        .node
        .keeper()
        .get_incomplete_events()
        .unwrap()
        .iter()
        .all(|e| e.in_tx.id != in_hash));
}

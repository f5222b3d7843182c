//! A small harness: a running network with N genesis validators and one
//! asgard vault, plus helpers to broadcast witnesses the way the bifrost
//! observers would.

use node_runtime::genesis::{GenesisConfig, GenesisNode};
use node_runtime::RuneNode;
use rc_10_handlers::messages::{MsgObservedTxIn, MsgObservedTxOut};
use rc_10_handlers::{HandlerResult, Msg};
use shared_types::{
    Address, Asset, Chain, Coin, Constants, Gas, NodeAddress, ObservedTx, PubKey, Tx, TxId,
    Version, ONE,
};

/// The asgard pubkey every test network starts with.
pub const ASGARD: &str = "asgard-genesis";

/// A network under test.
pub struct TestNet {
    /// The node being driven.
    pub node: RuneNode,
    /// Number of genesis validators.
    pub validators: usize,
}

impl TestNet {
    /// A network of `validators` active nodes, each bonded 100k RUNE,
    /// with a 22M RUNE reserve.
    pub fn new(validators: usize) -> Self {
        let mut node = RuneNode::new(Constants::default());
        let genesis = GenesisConfig {
            nodes: (0..validators)
                .map(|n| GenesisNode {
                    node_address: NodeAddress::new(&format!("rune1node{n}")),
                    node_pub_key: PubKey::new(&format!("node-pk-{n}")),
                    validator_cons_pub_key: PubKey::new(&format!("cons-pk-{n}")),
                    bond: 100_000 * ONE,
                    bond_address: Address::new(&format!("rune1bond{n}")),
                })
                .collect(),
            asgard_pub_key: PubKey::new(ASGARD),
            reserve: 22_000_000 * ONE,
            version: Version::new(0, 1, 0),
        };
        node.init_chain(&genesis).unwrap();
        Self { node, validators }
    }

    /// The address of validator `n`.
    pub fn signer(&self, n: usize) -> NodeAddress {
        NodeAddress::new(&format!("rune1node{n}"))
    }

    /// Build an inbound tx to the asgard vault.
    pub fn inbound(&self, from: &str, memo: &str, coins: Vec<Coin>) -> ObservedTx {
        let tx = Tx::new(
            TxId::from_hash(format!("{from}|{memo}").as_bytes()),
            Chain::Bnb,
            Address::new(from),
            Address::new("bnb1vaultaddr"),
            coins.into(),
            Gas::default(),
            memo,
        );
        ObservedTx::new(tx, 5_000_000 + self.node.height(), PubKey::new(ASGARD))
    }

    /// Deliver the witness from enough validators for supermajority.
    pub fn broadcast_in(&mut self, observed: ObservedTx) -> Vec<HandlerResult> {
        let quorum = (2 * self.validators).div_ceil(3);
        (0..quorum)
            .map(|n| {
                self.node.deliver_msg(Msg::ObservedTxIn(MsgObservedTxIn {
                    txs: vec![observed.clone()],
                    signer: self.signer(n),
                }))
            })
            .collect()
    }

    /// Deliver an outbound witness from enough validators.
    pub fn broadcast_out(&mut self, observed: ObservedTx) -> Vec<HandlerResult> {
        let quorum = (2 * self.validators).div_ceil(3);
        (0..quorum)
            .map(|n| {
                self.node.deliver_msg(Msg::ObservedTxOut(MsgObservedTxOut {
                    txs: vec![observed.clone()],
                    signer: self.signer(n),
                }))
            })
            .collect()
    }

    /// Stake and run a block, opening the pool.
    pub fn open_pool(&mut self, asset: &Asset, rune: u128, depth: u128) {
        let height = self.node.height() + 1;
        self.node.begin_block(height).unwrap();
        let observed = self.inbound(
            "bnb1genesisstaker",
            &format!("stake:{asset}"),
            vec![Coin::rune(rune), Coin::new(asset.clone(), depth)],
        );
        for result in self.broadcast_in(observed) {
            assert!(result.is_ok(), "{}", result.log);
        }
        self.node.end_block().unwrap();
    }

    /// Run an empty block.
    pub fn next_block(&mut self) {
        let height = self.node.height() + 1;
        self.node.begin_block(height).unwrap();
        self.node.end_block().unwrap();
    }
}

//! The outbound store.

use crate::errors::TxOutError;
use rc_01_memo::Memo;
use rc_02_keeper::{Keeper, TxMarker};
use shared_types::{
    safe_sub, select_by_max_coin, Coin, Constants, Event, EventFee, EventStatus, Fee,
    PoolStatus, Tx, TxId, TxOutItem, Vault, VaultStatus,
};
use tracing::{debug, info, warn};

/// Per-block outbound item builder.
///
/// One instance lives for the whole process; `new_block` rebinds it to the
/// current height before messages are delivered.
pub struct TxOutStore {
    height: u64,
}

impl Default for TxOutStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TxOutStore {
    /// Create a store; call [`TxOutStore::new_block`] before use.
    pub fn new() -> Self {
        Self { height: 0 }
    }

    /// Bind the store to the block being executed.
    pub fn new_block(&mut self, height: u64) {
        self.height = height;
    }

    /// The height the store is bound to.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Validate, price, and append an outbound item to the current block.
    /// Returns false when the item was legitimately dropped (self-send,
    /// zero value after fees, no fundable vault for internal items).
    pub fn try_add_tx_out_item(
        &self,
        keeper: &mut Keeper,
        constants: &Constants,
        toi: TxOutItem,
    ) -> Result<bool, TxOutError> {
        let toi = match self.prepare_tx_out_item(keeper, constants, toi)? {
            Some(toi) => toi,
            None => return Ok(false),
        };
        self.add_to_block_out(keeper, toi)?;
        Ok(true)
    }

    /// Blindly append an item, skipping vault selection and fee deduction.
    /// Used by teardown paths that must not fail.
    pub fn unsafe_add_tx_out_item(
        &self,
        keeper: &mut Keeper,
        toi: TxOutItem,
    ) -> Result<(), TxOutError> {
        self.add_to_block_out(keeper, toi)
    }

    /// The items scheduled so far in this block.
    pub fn get_outbound_items(&self, keeper: &Keeper) -> Result<Vec<TxOutItem>, TxOutError> {
        Ok(keeper.get_txout(self.height)?.tx_array)
    }

    fn prepare_tx_out_item(
        &self,
        keeper: &mut Keeper,
        constants: &Constants,
        mut toi: TxOutItem,
    ) -> Result<Option<TxOutItem>, TxOutError> {
        if toi.in_hash.is_empty() {
            toi.in_hash = TxId::blank();
        }
        if toi.memo.is_empty() {
            toi.memo = Memo::Outbound {
                tx_id: toi.in_hash.clone(),
            }
            .to_string();
        }
        let memo = toi.memo.parse::<Memo>().ok();
        let internal = memo.as_ref().map(Memo::is_internal).unwrap_or(false);

        // pick the signing vault: a yggdrasil that saw the inbound and can
        // fund the item, otherwise the deepest active asgard
        if toi.vault_pub_key.is_empty() {
            let yggs = self.collect_yggdrasil_vaults(keeper, &toi)?;
            if let Some(vault) = select_by_max_coin(&yggs, &toi.coin.asset) {
                if toi.coin.amount < vault.amount_of(&toi.coin.asset) {
                    toi.vault_pub_key = vault.pub_key.clone();
                }
            }
        }
        if toi.vault_pub_key.is_empty() {
            let active = keeper.get_asgards_by_status(VaultStatus::Active)?;
            let vault = select_by_max_coin(&active, &toi.coin.asset)
                .ok_or_else(|| TxOutError::NoVaultAvailable(toi.coin.to_string()))?;
            if toi.coin.amount > vault.amount_of(&toi.coin.asset) {
                return Err(TxOutError::NoVaultAvailable(toi.coin.to_string()));
            }
            toi.vault_pub_key = vault.pub_key.clone();
        }

        // never send a vault to itself
        let from_addr = toi.vault_pub_key.address(toi.chain);
        if from_addr == toi.to_address {
            warn!(to = %toi.to_address, "refusing self-send outbound");
            return Ok(None);
        }

        let transaction_fee = keeper.constant_or_mimir(
            shared_types::constants::mimir_keys::TRANSACTION_FEE,
            constants.transaction_fee,
        )?;

        if toi.max_gas.is_empty() {
            let gas_asset = toi.chain.gas_asset();
            let max_amt = if toi.chain.supports_multi_send() {
                // multi-send batches coins into one tx, halving per-coin gas
                let pool = keeper.get_pool(&gas_asset)?;
                pool.rune_value_in_asset(transaction_fee / 2)
            } else {
                let observed = keeper.get_gas(&gas_asset)?;
                if observed > 0 {
                    observed
                } else {
                    let pool = keeper.get_pool(&gas_asset)?;
                    pool.rune_value_in_asset(transaction_fee / 2)
                }
            };
            toi.max_gas = vec![Coin::new(gas_asset, max_amt)].into();
        }

        // deduct the network fee, but only while the network is large
        // enough to be byzantine-fault tolerant, and never on the
        // network's own fund movements
        let actives = keeper.total_active_node_accounts()?;
        if !internal && actives >= constants.minimum_nodes_for_bft {
            let fee = if toi.coin.is_rune() {
                let rune_fee = toi.coin.amount.min(transaction_fee);
                toi.coin.amount = safe_sub(toi.coin.amount, rune_fee);
                keeper.add_fee_to_reserve(rune_fee)?;
                Fee {
                    coins: vec![Coin::rune(rune_fee)].into(),
                    pool_deduct: 0,
                }
            } else {
                let mut pool = keeper.get_pool(&toi.coin.asset)?;
                let mut asset_fee = pool.rune_value_in_asset(transaction_fee);
                let rune_fee = if toi.coin.amount <= asset_fee {
                    asset_fee = toi.coin.amount;
                    pool.asset_value_in_rune(asset_fee)
                } else {
                    transaction_fee
                };
                toi.coin.amount = safe_sub(toi.coin.amount, asset_fee);
                let pool_deduct = rune_fee.min(pool.balance_rune);
                pool.balance_asset += asset_fee;
                pool.balance_rune = safe_sub(pool.balance_rune, rune_fee);
                if pool.balance_rune == 0 && pool.status == PoolStatus::Enabled {
                    pool.status = PoolStatus::Bootstrap;
                }
                keeper.set_pool(self.height, &pool)?;
                keeper.add_fee_to_reserve(pool_deduct)?;
                Fee {
                    coins: vec![Coin::new(toi.coin.asset.clone(), asset_fee)].into(),
                    pool_deduct,
                }
            };
            self.emit_fee_event(keeper, &toi.in_hash, fee)?;
        }

        // the signer fills in the coin for a yggdrasil recall by draining
        // the account, so a zero coin is only meaningful there
        let is_ygg_return = matches!(memo, Some(Memo::YggdrasilReturn { .. }));
        if toi.coin.is_empty() && !is_ygg_return {
            info!(item = %toi.coin, "tx out item has zero coin");
            return Ok(None);
        }

        // tie the item to the inbound's voter so observation closes it
        if !toi.in_hash.is_blank() {
            let mut voter = keeper.get_observed_tx_voter(&toi.in_hash)?;
            voter.actions.push(toi.clone());
            keeper.set_observed_tx_voter(&voter)?;
        }

        Ok(Some(toi))
    }

    fn add_to_block_out(&self, keeper: &mut Keeper, mut toi: TxOutItem) -> Result<(), TxOutError> {
        toi.seq_no = keeper.next_seq_no(toi.chain)?;

        // internally initiated items come back in as observations with the
        // same memo; markers let the inbound handler recognize them
        if toi
            .memo
            .parse::<Memo>()
            .map(|m| m.is_internal())
            .unwrap_or(false)
        {
            let marker = TxMarker::new(self.height, toi.memo.clone());
            keeper.append_tx_marker(&toi.tx_hash(), marker)?;
        }

        debug!(chain = %toi.chain, seq_no = toi.seq_no, coin = %toi.coin, "scheduling outbound");
        keeper.append_txout(self.height, toi)?;
        Ok(())
    }

    fn collect_yggdrasil_vaults(
        &self,
        keeper: &Keeper,
        toi: &TxOutItem,
    ) -> Result<Vec<Vault>, TxOutError> {
        if toi.in_hash.is_blank() {
            return Ok(Vec::new());
        }
        let voter = keeper.get_observed_tx_voter(&toi.in_hash)?;
        let active = keeper.total_active_node_accounts()?;
        let observed = voter
            .consensus_tx(active)
            .cloned()
            .or_else(|| voter.txs.first().cloned());
        let Some(observed) = observed else {
            return Ok(Vec::new());
        };

        let gas_asset = toi.chain.gas_asset();
        let block = keeper.get_txout(self.height)?;
        let mut vaults = Vec::new();
        for mut vault in keeper.get_yggdrasils()? {
            // the vault must be able to pay the miner fee on that chain
            if !vault.has_asset(&gas_asset) {
                continue;
            }
            // skip vaults whose owner did not witness the inbound; they
            // may be offline
            let owner_signed = keeper
                .get_node_account_by_pub_key(&vault.pub_key)?
                .map(|na| observed.has_signed(&na.node_address))
                .unwrap_or(false);
            if !owner_signed {
                continue;
            }
            // deduct items already scheduled against this vault in this
            // block, so the view of its funds is current
            for item in &block.tx_array {
                if item.vault_pub_key == vault.pub_key {
                    vault.coins.sub(&item.coin);
                }
            }
            vaults.push(vault);
        }
        Ok(vaults)
    }

    fn emit_fee_event(
        &self,
        keeper: &mut Keeper,
        in_hash: &TxId,
        fee: Fee,
    ) -> Result<(), TxOutError> {
        let payload = serde_json::to_value(EventFee {
            tx_id: in_hash.clone(),
            fee: fee.clone(),
        })
        .map_err(|e| rc_02_keeper::KeeperError::Codec {
            key: "fee-event".to_string(),
            reason: e.to_string(),
        })?;
        let mut in_tx = Tx::default();
        in_tx.id = in_hash.clone();
        let mut event = Event::new(EventFee::TYPE, self.height, in_tx, payload, EventStatus::Success);
        event.fee = fee;
        keeper.set_completed_event(event)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_02_keeper::MemoryStore;
    use shared_types::{
        Address, Asset, Chain, Coins, NodeAccount, NodeAddress, NodePubKeys, NodeStatus,
        ObservedTx, Pool, PubKey, VaultType, ONE,
    };

    fn keeper() -> Keeper {
        Keeper::new(Box::new(MemoryStore::new()))
    }

    fn bnb() -> Asset {
        Asset::new(Chain::Bnb, "BNB")
    }

    fn store_at(height: u64) -> TxOutStore {
        let mut store = TxOutStore::new();
        store.new_block(height);
        store
    }

    fn add_active_nodes(keeper: &mut Keeper, count: u8) {
        for n in 0..count {
            let na = NodeAccount::new(
                NodeAddress::new(&format!("rune1node{n}")),
                NodeStatus::Active,
                NodePubKeys {
                    node_pub_key: PubKey::new(&format!("node-pk-{n}")),
                    validator_cons_pub_key: PubKey::new(&format!("cons-pk-{n}")),
                },
                100 * ONE,
                Address::new("bnb1bond"),
                1,
            );
            keeper.set_node_account(&na).unwrap();
        }
    }

    fn add_asgard(keeper: &mut Keeper, pk: &str, coins: Vec<Coin>) {
        let mut vault = Vault::new(VaultType::Asgard, VaultStatus::Active, 1, PubKey::new(pk));
        vault.add_funds(&Coins::from(coins));
        keeper.set_vault(&vault).unwrap();
    }

    fn seed_pool(keeper: &mut Keeper, rune: u128, asset: u128) {
        let mut pool = Pool::new(bnb());
        pool.balance_rune = rune;
        pool.balance_asset = asset;
        pool.pool_units = rune;
        keeper.set_pool(1, &pool).unwrap();
    }

    fn item(amount: u128) -> TxOutItem {
        TxOutItem::new(
            Chain::Bnb,
            Address::new("bnb1dest"),
            Coin::new(bnb(), amount),
            TxId::from_hash(b"inbound"),
        )
    }

    #[test]
    fn test_asgard_selected_and_fee_deducted() {
        let mut keeper = keeper();
        add_active_nodes(&mut keeper, 4);
        add_asgard(&mut keeper, "asgard-pk", vec![Coin::new(bnb(), 1_000 * ONE)]);
        seed_pool(&mut keeper, 100 * ONE, 100 * ONE);

        let store = store_at(10);
        let added = store
            .try_add_tx_out_item(&mut keeper, &Constants::default(), item(10 * ONE))
            .unwrap();
        assert!(added);

        let items = store.get_outbound_items(&keeper).unwrap();
        assert_eq!(items.len(), 1);
        let out = &items[0];
        assert_eq!(out.vault_pub_key, PubKey::new("asgard-pk"));
        assert_eq!(out.memo, format!("OUTBOUND:{}", TxId::from_hash(b"inbound")));
        // fee: 1 RUNE worth of BNB at 1:1 ratio
        assert_eq!(out.coin.amount, 9 * ONE);
        // the RUNE side of the fee went to the reserve
        assert_eq!(keeper.get_vault_data().unwrap().total_reserve, ONE);
        // pool absorbed the asset fee and shed the RUNE fee
        let pool = keeper.get_pool(&bnb()).unwrap();
        assert_eq!(pool.balance_asset, 101 * ONE);
        assert_eq!(pool.balance_rune, 99 * ONE);
        // voter now carries the action
        let voter = keeper
            .get_observed_tx_voter(&TxId::from_hash(b"inbound"))
            .unwrap();
        assert_eq!(voter.actions.len(), 1);
    }

    #[test]
    fn test_no_fee_below_bft_minimum() {
        let mut keeper = keeper();
        add_active_nodes(&mut keeper, 2);
        add_asgard(&mut keeper, "asgard-pk", vec![Coin::new(bnb(), 1_000 * ONE)]);
        seed_pool(&mut keeper, 100 * ONE, 100 * ONE);

        let store = store_at(10);
        store
            .try_add_tx_out_item(&mut keeper, &Constants::default(), item(10 * ONE))
            .unwrap();
        let items = store.get_outbound_items(&keeper).unwrap();
        assert_eq!(items[0].coin.amount, 10 * ONE);
        assert_eq!(keeper.get_vault_data().unwrap().total_reserve, 0);
    }

    #[test]
    fn test_internal_memo_exempt_from_fees() {
        let mut keeper = keeper();
        add_active_nodes(&mut keeper, 4);
        add_asgard(&mut keeper, "asgard-pk", vec![Coin::new(bnb(), 1_000 * ONE)]);
        seed_pool(&mut keeper, 100 * ONE, 100 * ONE);

        let mut toi = item(10 * ONE);
        toi.in_hash = TxId::blank();
        toi.memo = "MIGRATE:10".to_string();
        let store = store_at(10);
        store
            .try_add_tx_out_item(&mut keeper, &Constants::default(), toi)
            .unwrap();
        let items = store.get_outbound_items(&keeper).unwrap();
        assert_eq!(items[0].coin.amount, 10 * ONE);
        // a marker was left for the return observation
        let markers = keeper.get_tx_markers(&items[0].tx_hash()).unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].memo, "MIGRATE:10");
    }

    #[test]
    fn test_self_send_refused() {
        let mut keeper = keeper();
        add_active_nodes(&mut keeper, 4);
        add_asgard(&mut keeper, "asgard-pk", vec![Coin::new(bnb(), 1_000 * ONE)]);
        seed_pool(&mut keeper, 100 * ONE, 100 * ONE);

        let mut toi = item(10 * ONE);
        toi.to_address = PubKey::new("asgard-pk").address(Chain::Bnb);
        let store = store_at(10);
        let added = store
            .try_add_tx_out_item(&mut keeper, &Constants::default(), toi)
            .unwrap();
        assert!(!added);
        assert!(store.get_outbound_items(&keeper).unwrap().is_empty());
    }

    #[test]
    fn test_seq_no_strictly_increasing_per_chain() {
        let mut keeper = keeper();
        add_active_nodes(&mut keeper, 2);
        add_asgard(&mut keeper, "asgard-pk", vec![Coin::new(bnb(), 1_000 * ONE)]);
        seed_pool(&mut keeper, 100 * ONE, 100 * ONE);

        let store = store_at(10);
        for _ in 0..3 {
            store
                .try_add_tx_out_item(&mut keeper, &Constants::default(), item(ONE))
                .unwrap();
        }
        let items = store.get_outbound_items(&keeper).unwrap();
        let seqs: Vec<u64> = items.iter().map(|i| i.seq_no).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn test_yggdrasil_preferred_when_it_observed() {
        let mut keeper = keeper();
        add_active_nodes(&mut keeper, 4);
        add_asgard(&mut keeper, "asgard-pk", vec![Coin::new(bnb(), 1_000 * ONE)]);
        seed_pool(&mut keeper, 100 * ONE, 100 * ONE);

        // node0's yggdrasil has plenty of BNB
        let mut ygg = Vault::new(
            VaultType::Yggdrasil,
            VaultStatus::Active,
            1,
            PubKey::new("node-pk-0"),
        );
        ygg.add_funds(&Coins::from(vec![Coin::new(bnb(), 500 * ONE)]));
        keeper.set_vault(&ygg).unwrap();

        // node0 observed the inbound
        let tx = Tx::new(
            TxId::from_hash(b"inbound"),
            Chain::Bnb,
            Address::new("bnb1sender"),
            Address::new("bnb1vault"),
            vec![Coin::new(bnb(), 10 * ONE)].into(),
            Coins::default(),
            "swap:RUNE",
        );
        let mut voter = keeper
            .get_observed_tx_voter(&TxId::from_hash(b"inbound"))
            .unwrap();
        let mut observed = ObservedTx::new(tx, 50, PubKey::new("asgard-pk"));
        observed.sign(NodeAddress::new("rune1node0"));
        voter.txs.push(observed);
        keeper.set_observed_tx_voter(&voter).unwrap();

        let store = store_at(10);
        store
            .try_add_tx_out_item(&mut keeper, &Constants::default(), item(10 * ONE))
            .unwrap();
        let items = store.get_outbound_items(&keeper).unwrap();
        assert_eq!(items[0].vault_pub_key, PubKey::new("node-pk-0"));
    }

    #[test]
    fn test_no_vault_is_an_error() {
        let mut keeper = keeper();
        add_active_nodes(&mut keeper, 4);
        seed_pool(&mut keeper, 100 * ONE, 100 * ONE);
        let store = store_at(10);
        let err = store
            .try_add_tx_out_item(&mut keeper, &Constants::default(), item(10 * ONE))
            .unwrap_err();
        assert!(matches!(err, TxOutError::NoVaultAvailable(_)));
    }

    #[test]
    fn test_max_gas_halved_on_multi_send_chains() {
        let mut keeper = keeper();
        add_active_nodes(&mut keeper, 2);
        add_asgard(&mut keeper, "asgard-pk", vec![Coin::new(bnb(), 1_000 * ONE)]);
        seed_pool(&mut keeper, 100 * ONE, 100 * ONE);

        let store = store_at(10);
        store
            .try_add_tx_out_item(&mut keeper, &Constants::default(), item(10 * ONE))
            .unwrap();
        let items = store.get_outbound_items(&keeper).unwrap();
        // fee/2 = 0.5 RUNE converted 1:1 into BNB
        assert_eq!(items[0].max_gas.amount_of(&bnb()), ONE / 2);
    }
}

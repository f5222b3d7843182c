//! Slash-point accounting.

use crate::errors::ValidatorError;
use rc_02_keeper::Keeper;
use shared_types::{mul_div, safe_sub, Asset, Constants, NodeAddress, PubKey};
use rc_06_txout::TxOutStore;
use tracing::{info, warn};

/// Applies slash points and bond slashes.
pub struct Slasher;

impl Slasher {
    /// EndBlock: every active node absent from the block's observing set
    /// gains slash points, then the set resets for the next block.
    pub fn lack_observing(
        keeper: &mut Keeper,
        constants: &Constants,
    ) -> Result<(), ValidatorError> {
        let observed = keeper.get_observing_addresses()?;
        if observed.is_empty() {
            // nothing was observed this block, nobody to punish
            return Ok(());
        }
        for mut na in keeper.list_active_node_accounts()? {
            if !observed.contains(&na.node_address) {
                na.add_slash_points(constants.lack_of_observation_penalty);
                keeper.set_node_account(&na)?;
            }
        }
        keeper.clear_observing_addresses()?;
        Ok(())
    }

    /// EndBlock: outbound items that sat unsigned past their deadline
    /// slash the assigned vault's owner and move to an active asgard so
    /// the payment still happens.
    pub fn lack_signing(
        keeper: &mut Keeper,
        txout: &TxOutStore,
        constants: &Constants,
        height: u64,
    ) -> Result<(), ValidatorError> {
        if height <= constants.signing_transaction_period {
            return Ok(());
        }
        let deadline_height = height - constants.signing_transaction_period;
        let batch = keeper.get_txout(deadline_height)?;
        if batch.is_empty() {
            return Ok(());
        }

        let mut updated = batch.clone();
        for (i, item) in batch.tx_array.iter().enumerate() {
            if !item.out_hash.is_empty() {
                continue;
            }
            // the owner failed to sign in time
            if let Some(mut na) = keeper.get_node_account_by_pub_key(&item.vault_pub_key)? {
                let points = constants.signing_transaction_period * 2;
                na.add_slash_points(points);
                keeper.set_node_account(&na)?;
                warn!(node = %na.node_address, points, "slashed for not signing outbound");
            }

            // hand the item to the asgard set to retry
            let mut retry = item.clone();
            retry.vault_pub_key = PubKey::default();
            retry.out_hash = Default::default();
            if txout.try_add_tx_out_item(keeper, constants, retry).is_ok() {
                // mark the stale copy so it is not retried again
                updated.tx_array[i].out_hash = item.tx_hash();
            }
        }
        keeper.set_txout(&updated)?;
        Ok(())
    }

    /// Slash a vault owner's bond by 1.5x the RUNE value of coins it sent
    /// beyond what was scheduled. The slashed RUNE moves to the reserve.
    pub fn slash_node_account(
        keeper: &mut Keeper,
        observed_pub_key: &PubKey,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), ValidatorError> {
        if amount == 0 {
            return Ok(());
        }
        let rune_value = if asset.is_rune() {
            amount
        } else {
            keeper.get_pool(asset)?.asset_value_in_rune(amount)
        };
        let slash = mul_div(rune_value, 3, 2);

        let Some(mut na) = keeper.get_node_account_by_pub_key(observed_pub_key)? else {
            warn!(pub_key = %observed_pub_key, "over-send from vault with no known owner");
            return Ok(());
        };
        let taken = slash.min(na.bond);
        na.bond = safe_sub(na.bond, slash);
        keeper.set_node_account(&na)?;
        keeper.add_fee_to_reserve(taken)?;
        info!(node = %na.node_address, slash = taken, "bond slashed for over-send");
        Ok(())
    }

    /// Apply slash points to every node blamed in a failed TSS ceremony.
    pub fn slash_blamed_nodes(
        keeper: &mut Keeper,
        blame: &[NodeAddress],
        points: u64,
    ) -> Result<(), ValidatorError> {
        for addr in blame {
            let mut na = keeper.get_node_account(addr)?;
            if na.bond == 0 && na.status == shared_types::NodeStatus::WhiteListed {
                // unknown address, nothing to slash
                continue;
            }
            na.add_slash_points(points);
            keeper.set_node_account(&na)?;
            info!(node = %addr, points, "slashed for tss blame");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_02_keeper::MemoryStore;
    use shared_types::{
        Address, Chain, Coin, Coins, NodeAccount, NodePubKeys, NodeStatus, Pool, TxId,
        TxOutItem, Vault, VaultStatus, VaultType, ONE,
    };

    fn keeper() -> Keeper {
        Keeper::new(Box::new(MemoryStore::new()))
    }

    fn node(n: u8, bond: u128) -> NodeAccount {
        NodeAccount::new(
            NodeAddress::new(&format!("rune1node{n}")),
            NodeStatus::Active,
            NodePubKeys {
                node_pub_key: PubKey::new(&format!("node-pk-{n}")),
                validator_cons_pub_key: PubKey::new(&format!("cons-pk-{n}")),
            },
            bond,
            Address::new("rune1bond"),
            1,
        )
    }

    #[test]
    fn test_lack_observing_slashes_absentees() {
        let mut keeper = keeper();
        for n in 0..3 {
            keeper.set_node_account(&node(n, 100 * ONE)).unwrap();
        }
        keeper
            .add_observing_addresses(&[NodeAddress::new("rune1node0")])
            .unwrap();

        Slasher::lack_observing(&mut keeper, &Constants::default()).unwrap();

        assert_eq!(
            keeper
                .get_node_account(&NodeAddress::new("rune1node0"))
                .unwrap()
                .slash_points,
            0
        );
        for n in [1, 2] {
            assert_eq!(
                keeper
                    .get_node_account(&NodeAddress::new(&format!("rune1node{n}")))
                    .unwrap()
                    .slash_points,
                2,
                "node{n}"
            );
        }
        // the set was cleared for the next block
        assert!(keeper.get_observing_addresses().unwrap().is_empty());
    }

    #[test]
    fn test_lack_observing_skips_empty_blocks() {
        let mut keeper = keeper();
        keeper.set_node_account(&node(0, 100 * ONE)).unwrap();
        Slasher::lack_observing(&mut keeper, &Constants::default()).unwrap();
        assert_eq!(
            keeper
                .get_node_account(&NodeAddress::new("rune1node0"))
                .unwrap()
                .slash_points,
            0
        );
    }

    #[test]
    fn test_lack_signing_slashes_and_reschedules() {
        let mut keeper = keeper();
        let constants = Constants::default();
        keeper.set_node_account(&node(0, 100 * ONE)).unwrap();
        // an asgard to take over the payment
        let mut asgard = Vault::new(
            VaultType::Asgard,
            VaultStatus::Active,
            1,
            PubKey::new("asgard-pk"),
        );
        asgard.add_funds(&Coins::from(vec![Coin::new(
            Asset::new(Chain::Bnb, "BNB"),
            100 * ONE,
        )]));
        keeper.set_vault(&asgard).unwrap();
        let mut pool = Pool::new(Asset::new(Chain::Bnb, "BNB"));
        pool.balance_rune = 100 * ONE;
        pool.balance_asset = 100 * ONE;
        keeper.set_pool(1, &pool).unwrap();

        // an item scheduled long ago against node0's yggdrasil, never signed
        let mut item = TxOutItem::new(
            Chain::Bnb,
            Address::new("bnb1dest"),
            Coin::new(Asset::new(Chain::Bnb, "BNB"), ONE),
            TxId::from_hash(b"in"),
        );
        item.vault_pub_key = PubKey::new("node-pk-0");
        let scheduled_height = 10;
        keeper.append_txout(scheduled_height, item).unwrap();

        let current = scheduled_height + constants.signing_transaction_period;
        let mut store = TxOutStore::new();
        store.new_block(current);
        Slasher::lack_signing(&mut keeper, &store, &constants, current).unwrap();

        let na = keeper
            .get_node_account(&NodeAddress::new("rune1node0"))
            .unwrap();
        assert_eq!(na.slash_points, constants.signing_transaction_period * 2);
        // rescheduled onto asgard in the current block
        let items = store.get_outbound_items(&keeper).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].vault_pub_key, PubKey::new("asgard-pk"));
        // original marked handled
        let old = keeper.get_txout(scheduled_height).unwrap();
        assert!(!old.tx_array[0].out_hash.is_empty());
    }

    #[test]
    fn test_over_send_slash_is_one_and_a_half_times() {
        let mut keeper = keeper();
        keeper.set_node_account(&node(0, 100 * ONE)).unwrap();
        let mut pool = Pool::new(Asset::new(Chain::Bnb, "BNB"));
        pool.balance_rune = 100 * ONE;
        pool.balance_asset = 50 * ONE;
        keeper.set_pool(1, &pool).unwrap();

        // over-sent 1 BNB = 2 RUNE; slash 3 RUNE
        Slasher::slash_node_account(
            &mut keeper,
            &PubKey::new("node-pk-0"),
            &Asset::new(Chain::Bnb, "BNB"),
            ONE,
        )
        .unwrap();
        let na = keeper
            .get_node_account(&NodeAddress::new("rune1node0"))
            .unwrap();
        assert_eq!(na.bond, 97 * ONE);
        assert_eq!(keeper.get_vault_data().unwrap().total_reserve, 3 * ONE);
    }

    #[test]
    fn test_tss_blame_slash() {
        let mut keeper = keeper();
        keeper.set_node_account(&node(0, 100 * ONE)).unwrap();
        keeper.set_node_account(&node(1, 100 * ONE)).unwrap();
        Slasher::slash_blamed_nodes(
            &mut keeper,
            &[NodeAddress::new("rune1node1")],
            Constants::default().fail_keygen_slash_points,
        )
        .unwrap();
        assert_eq!(
            keeper
                .get_node_account(&NodeAddress::new("rune1node1"))
                .unwrap()
                .slash_points,
            720
        );
        assert_eq!(
            keeper
                .get_node_account(&NodeAddress::new("rune1node0"))
                .unwrap()
                .slash_points,
            0
        );
    }
}

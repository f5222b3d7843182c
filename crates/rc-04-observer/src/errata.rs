//! Errata: retroactive reversal of an observed tx's pool effects.

use crate::errors::ObserverError;
use rc_01_memo::Memo;
use rc_02_keeper::Keeper;
use shared_types::{
    safe_sub, Chain, Event, EventErrata, EventStatus, NodeAddress, PoolMod, Tx, TxId,
};
use tracing::{info, warn};

/// What an errata vote did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrataOutcome {
    /// Recorded; consensus not reached yet.
    Pending,
    /// Already applied earlier; the vote was bookkeeping only.
    AlreadyApplied,
    /// This vote reached consensus and the correction was applied.
    Applied(PoolMod),
    /// Consensus reached but the tx does not touch pool state; nothing to
    /// reverse.
    NothingToReverse,
}

/// Record an errata vote for `(tx_id, chain)` and, on first consensus,
/// reverse the observed tx's pool effects: subtract its coins from the
/// pool and, for stakes, zero the malicious staker's units.
pub fn apply_errata(
    keeper: &mut Keeper,
    tx_id: &TxId,
    chain: Chain,
    signer: NodeAddress,
    active_nodes: usize,
    height: u64,
) -> Result<ErrataOutcome, ObserverError> {
    let mut voter = keeper.get_errata_tx_voter(tx_id, chain)?;
    voter.sign(signer);
    keeper.set_errata_tx_voter(&voter)?;

    if !voter.has_consensus(active_nodes) {
        return Ok(ErrataOutcome::Pending);
    }
    if voter.block_height > 0 {
        // idempotent per (tx_id, chain)
        return Ok(ErrataOutcome::AlreadyApplied);
    }
    voter.block_height = height;
    keeper.set_errata_tx_voter(&voter)?;

    // the disputed content is whatever the observation voter agreed on
    let observed_voter = keeper.get_observed_tx_voter(tx_id)?;
    let observed = match observed_voter
        .consensus_tx(active_nodes)
        .or_else(|| observed_voter.txs.first())
    {
        Some(observed) => observed.clone(),
        None => {
            warn!(%tx_id, "errata for unknown tx");
            return Ok(ErrataOutcome::NothingToReverse);
        }
    };
    let tx = observed.tx;
    if tx.chain != chain {
        return Ok(ErrataOutcome::NothingToReverse);
    }

    // only swaps and stakes moved funds into a pool
    let memo = tx.memo.parse::<Memo>().ok();
    let asset = match &memo {
        Some(Memo::Stake { asset, .. }) => Some(asset.clone()),
        Some(Memo::Swap { asset, .. }) => {
            if asset.is_rune() {
                // RUNE target: the source pool took the coins
                tx.coins
                    .iter()
                    .find(|c| !c.is_rune())
                    .map(|c| c.asset.clone())
            } else {
                Some(asset.clone())
            }
        }
        _ => None,
    };
    let Some(asset) = asset else {
        return Ok(ErrataOutcome::NothingToReverse);
    };

    let mut rune_amt = 0;
    let mut asset_amt = 0;
    for coin in tx.coins.iter() {
        if coin.is_rune() {
            rune_amt = coin.amount;
        } else {
            asset_amt = coin.amount;
        }
    }

    let mut pool = keeper.get_pool(&asset)?;
    pool.balance_rune = safe_sub(pool.balance_rune, rune_amt);
    pool.balance_asset = safe_sub(pool.balance_asset, asset_amt);

    if matches!(memo, Some(Memo::Stake { .. })) {
        // the depositor was malicious; burn their whole position
        let mut staker = keeper.get_staker(&asset, &tx.from_address)?;
        pool.pool_units = safe_sub(pool.pool_units, staker.units);
        staker.units = 0;
        staker.pending_rune = 0;
        keeper.remove_staker(&staker)?;
    }

    keeper.set_pool(height, &pool)?;
    info!(%tx_id, %chain, pool = %asset, rune_amt, asset_amt, "errata applied");

    let pool_mod = PoolMod {
        asset,
        rune_amt,
        rune_add: false,
        asset_amt,
        asset_add: false,
    };
    let payload = serde_json::to_value(EventErrata {
        pools: vec![pool_mod.clone()],
    })
    .map_err(|e| ObserverError::Validation(e.to_string()))?;
    let mut in_tx = Tx::default();
    in_tx.id = tx_id.clone();
    keeper.set_completed_event(Event::new(
        EventErrata::TYPE,
        height,
        in_tx,
        payload,
        EventStatus::Success,
    ))?;

    Ok(ErrataOutcome::Applied(pool_mod))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::add_observed_tx;
    use rc_02_keeper::MemoryStore;
    use shared_types::{Address, Asset, Coin, Gas, ObservedTx, Pool, PubKey, Staker, ONE};

    fn keeper() -> Keeper {
        Keeper::new(Box::new(MemoryStore::new()))
    }

    fn bnb() -> Asset {
        Asset::new(Chain::Bnb, "BNB")
    }

    fn node(n: u8) -> NodeAddress {
        NodeAddress::new(&format!("rune1node{n}"))
    }

    /// Seed: pool {R=100,A=100,units=1600} after staker S deposited 30 RUNE
    /// (units=800), then errata for S's tx.
    fn seed(keeper: &mut Keeper) -> TxId {
        let mut pool = Pool::new(bnb());
        pool.balance_rune = 100 * ONE;
        pool.balance_asset = 100 * ONE;
        pool.pool_units = 1_600;
        keeper.set_pool(1, &pool).unwrap();

        let mut staker = Staker::new(bnb(), Address::new("bnb1malicious"));
        staker.units = 800;
        keeper.set_staker(&staker).unwrap();

        let tx = Tx::new(
            TxId::from_hash(b"disputed"),
            Chain::Bnb,
            Address::new("bnb1malicious"),
            Address::new("bnb1vault"),
            vec![Coin::rune(30 * ONE)].into(),
            Gas::default(),
            "stake:BNB.BNB",
        );
        let observed = ObservedTx::new(tx, 500, PubKey::new("vault-pk"));
        for n in [1, 2, 3] {
            add_observed_tx(&mut *keeper, observed.clone(), node(n), 4, 10).unwrap();
        }
        TxId::from_hash(b"disputed")
    }

    #[test]
    fn test_errata_reverses_stake() {
        let mut keeper = keeper();
        let tx_id = seed(&mut keeper);

        for n in [1, 2] {
            let outcome =
                apply_errata(&mut keeper, &tx_id, Chain::Bnb, node(n), 4, 20).unwrap();
            assert_eq!(outcome, ErrataOutcome::Pending);
        }
        let outcome = apply_errata(&mut keeper, &tx_id, Chain::Bnb, node(3), 4, 20).unwrap();
        assert!(matches!(outcome, ErrataOutcome::Applied(_)));

        let pool = keeper.get_pool(&bnb()).unwrap();
        assert_eq!(pool.balance_rune, 70 * ONE);
        assert_eq!(pool.balance_asset, 100 * ONE);
        assert_eq!(pool.pool_units, 800);
        let staker = keeper
            .get_staker(&bnb(), &Address::new("bnb1malicious"))
            .unwrap();
        assert_eq!(staker.units, 0);
    }

    #[test]
    fn test_errata_idempotent_per_chain() {
        let mut keeper = keeper();
        let tx_id = seed(&mut keeper);
        for n in [1, 2, 3] {
            apply_errata(&mut keeper, &tx_id, Chain::Bnb, node(n), 4, 20).unwrap();
        }
        let outcome = apply_errata(&mut keeper, &tx_id, Chain::Bnb, node(4), 4, 25).unwrap();
        assert_eq!(outcome, ErrataOutcome::AlreadyApplied);
        // pool untouched the second time
        assert_eq!(keeper.get_pool(&bnb()).unwrap().balance_rune, 70 * ONE);
    }

    #[test]
    fn test_errata_for_unknown_tx_reverses_nothing() {
        let mut keeper = keeper();
        let ghost = TxId::from_hash(b"ghost");
        for n in [1, 2] {
            apply_errata(&mut keeper, &ghost, Chain::Bnb, node(n), 4, 20).unwrap();
        }
        let outcome = apply_errata(&mut keeper, &ghost, Chain::Bnb, node(3), 4, 20).unwrap();
        assert_eq!(outcome, ErrataOutcome::NothingToReverse);
    }
}

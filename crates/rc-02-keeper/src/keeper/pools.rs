//! Pool persistence.
//!
//! A status-change write synchronously emits a `pool` event; everything
//! else here is plain key-value semantics.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::{Asset, Event, EventPool, EventStatus, Pool, Tx, TxId};
use tracing::debug;

impl Keeper {
    fn pool_key(asset: &Asset) -> String {
        format!("{}{}", keys::POOL, asset)
    }

    /// Whether a pool exists for the asset.
    pub fn pool_exist(&self, asset: &Asset) -> Result<bool, KeeperError> {
        self.exists(&Self::pool_key(asset))
    }

    /// Fetch the pool, or an empty one when absent.
    pub fn get_pool(&self, asset: &Asset) -> Result<Pool, KeeperError> {
        Ok(self
            .fetch(&Self::pool_key(asset))?
            .unwrap_or_else(|| Pool::new(asset.clone())))
    }

    /// Persist the pool. Idempotent; a change of status emits a completed
    /// `pool` event keyed to the blank tx id.
    pub fn set_pool(&mut self, height: u64, pool: &Pool) -> Result<(), KeeperError> {
        let key = Self::pool_key(&pool.asset);
        let prior: Option<Pool> = self.fetch(&key)?;
        let status_changed = match &prior {
            Some(existing) => existing.status != pool.status,
            None => true,
        };
        self.put(&key, pool)?;
        if status_changed {
            debug!(pool = %pool.asset, status = %pool.status, "pool status change");
            let payload = serde_json::to_value(EventPool {
                pool: pool.asset.clone(),
                status: pool.status,
            })
            .map_err(|e| KeeperError::Codec {
                key,
                reason: e.to_string(),
            })?;
            let mut in_tx = Tx::default();
            in_tx.id = TxId::blank();
            let event = Event::new(EventPool::TYPE, height, in_tx, payload, EventStatus::Success);
            self.set_completed_event(event)?;
        }
        Ok(())
    }

    /// All pools, in asset key order.
    pub fn get_pools(&self) -> Result<Vec<Pool>, KeeperError> {
        self.scan(keys::POOL)
    }
}

#[cfg(test)]
mod tests {
    use crate::adapters::MemoryStore;
    use crate::keeper::Keeper;
    use shared_types::{Asset, Chain, Pool, PoolStatus, ONE};

    fn keeper() -> Keeper {
        Keeper::new(Box::new(MemoryStore::new()))
    }

    fn bnb() -> Asset {
        Asset::new(Chain::Bnb, "BNB")
    }

    #[test]
    fn test_missing_pool_is_empty() {
        let keeper = keeper();
        assert!(!keeper.pool_exist(&bnb()).unwrap());
        let pool = keeper.get_pool(&bnb()).unwrap();
        assert!(pool.is_empty());
        assert_eq!(pool.asset, bnb());
    }

    #[test]
    fn test_set_pool_round_trip() {
        let mut keeper = keeper();
        let mut pool = Pool::new(bnb());
        pool.balance_rune = 100 * ONE;
        pool.balance_asset = 50 * ONE;
        pool.pool_units = 75 * ONE;
        keeper.set_pool(1, &pool).unwrap();
        assert!(keeper.pool_exist(&bnb()).unwrap());
        assert_eq!(keeper.get_pool(&bnb()).unwrap(), pool);
    }

    #[test]
    fn test_status_change_emits_pool_event() {
        let mut keeper = keeper();
        let mut pool = Pool::new(bnb());
        keeper.set_pool(1, &pool).unwrap();
        let after_create = keeper.get_last_event_id().unwrap();

        // same status: no new event
        pool.balance_rune = ONE;
        keeper.set_pool(2, &pool).unwrap();
        assert_eq!(keeper.get_last_event_id().unwrap(), after_create);

        pool.status = PoolStatus::Bootstrap;
        keeper.set_pool(3, &pool).unwrap();
        assert_eq!(keeper.get_last_event_id().unwrap(), after_create + 1);
    }

    #[test]
    fn test_get_pools_sorted_by_asset() {
        let mut keeper = keeper();
        keeper
            .set_pool(1, &Pool::new(Asset::new(Chain::Btc, "BTC")))
            .unwrap();
        keeper.set_pool(1, &Pool::new(bnb())).unwrap();
        let pools = keeper.get_pools().unwrap();
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].asset, bnb());
    }
}

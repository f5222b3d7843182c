//! Operator overrides ("mimir"). A small escape hatch letting the admin
//! retune constants without a software release.

use super::{keys, Keeper};
use crate::errors::KeeperError;

impl Keeper {
    fn mimir_key(key: &str) -> String {
        format!("{}{}", keys::MIMIR, key)
    }

    /// Set an override value.
    pub fn set_mimir(&mut self, key: &str, value: i64) -> Result<(), KeeperError> {
        self.put(&Self::mimir_key(key), &value)
    }

    /// Fetch an override value, if set.
    pub fn get_mimir(&self, key: &str) -> Result<Option<i64>, KeeperError> {
        self.fetch(&Self::mimir_key(key))
    }

    /// The constant value unless the operator overrode it.
    pub fn constant_or_mimir(&self, key: &str, fallback: u128) -> Result<u128, KeeperError> {
        match self.get_mimir(key)? {
            Some(v) if v >= 0 => Ok(v as u128),
            _ => Ok(fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::adapters::MemoryStore;
    use crate::keeper::Keeper;

    #[test]
    fn test_mimir_override() {
        let mut keeper = Keeper::new(Box::new(MemoryStore::new()));
        assert_eq!(keeper.get_mimir("TransactionFee").unwrap(), None);
        assert_eq!(
            keeper.constant_or_mimir("TransactionFee", 100).unwrap(),
            100
        );
        keeper.set_mimir("TransactionFee", 250).unwrap();
        assert_eq!(
            keeper.constant_or_mimir("TransactionFee", 100).unwrap(),
            250
        );
        // negative overrides fall back to the constant
        keeper.set_mimir("TransactionFee", -1).unwrap();
        assert_eq!(
            keeper.constant_or_mimir("TransactionFee", 100).unwrap(),
            100
        );
    }
}

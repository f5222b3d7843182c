//! Vault persistence and the asgard index.

use super::{keys, Keeper};
use crate::errors::KeeperError;
use shared_types::{PubKey, Vault, VaultStatus, VaultType};

impl Keeper {
    fn vault_key(pub_key: &PubKey) -> String {
        format!("{}{}", keys::VAULT, pub_key)
    }

    /// Whether a vault exists for the key.
    pub fn vault_exists(&self, pub_key: &PubKey) -> Result<bool, KeeperError> {
        self.exists(&Self::vault_key(pub_key))
    }

    /// Fetch a vault; missing vaults are an error (callers create them
    /// explicitly through [`Keeper::set_vault`]).
    pub fn get_vault(&self, pub_key: &PubKey) -> Result<Vault, KeeperError> {
        self.fetch(&Self::vault_key(pub_key))?
            .ok_or_else(|| KeeperError::NotFound(format!("vault {pub_key}")))
    }

    /// Fetch the node's yggdrasil vault, creating an empty active record
    /// when it does not exist yet.
    pub fn get_yggdrasil(&self, pub_key: &PubKey, height: u64) -> Result<Vault, KeeperError> {
        Ok(self.fetch(&Self::vault_key(pub_key))?.unwrap_or_else(|| {
            Vault::new(
                VaultType::Yggdrasil,
                VaultStatus::Active,
                height,
                pub_key.clone(),
            )
        }))
    }

    /// Persist the vault, maintaining the asgard index.
    pub fn set_vault(&mut self, vault: &Vault) -> Result<(), KeeperError> {
        if vault.is_asgard() {
            let mut index = self.get_asgard_index()?;
            if !index.contains(&vault.pub_key) {
                index.push(vault.pub_key.clone());
                index.sort();
                self.put(keys::VAULT_ASGARD_INDEX, &index)?;
            }
        }
        self.put(&Self::vault_key(&vault.pub_key), vault)
    }

    /// Delete the vault and drop it from the asgard index.
    pub fn remove_vault(&mut self, pub_key: &PubKey) -> Result<(), KeeperError> {
        let mut index = self.get_asgard_index()?;
        if index.iter().any(|pk| pk == pub_key) {
            index.retain(|pk| pk != pub_key);
            self.put(keys::VAULT_ASGARD_INDEX, &index)?;
        }
        self.remove(&Self::vault_key(pub_key))
    }

    /// The sorted pubkeys of all asgard vaults ever created.
    pub fn get_asgard_index(&self) -> Result<Vec<PubKey>, KeeperError> {
        Ok(self.fetch(keys::VAULT_ASGARD_INDEX)?.unwrap_or_default())
    }

    /// All vaults, in pubkey order.
    pub fn get_vaults(&self) -> Result<Vec<Vault>, KeeperError> {
        self.scan(keys::VAULT)
    }

    /// All asgard vaults in the given status, in pubkey order.
    pub fn get_asgards_by_status(&self, status: VaultStatus) -> Result<Vec<Vault>, KeeperError> {
        let mut out = Vec::new();
        for pub_key in self.get_asgard_index()? {
            let vault = self.get_vault(&pub_key)?;
            if vault.has_status(status) {
                out.push(vault);
            }
        }
        Ok(out)
    }

    /// All yggdrasil vaults, in pubkey order.
    pub fn get_yggdrasils(&self) -> Result<Vec<Vault>, KeeperError> {
        Ok(self
            .get_vaults()?
            .into_iter()
            .filter(|v| v.is_yggdrasil())
            .collect())
    }
}

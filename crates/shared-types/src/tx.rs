//! # Transactions
//!
//! Identifier newtypes and the chain-agnostic transaction record carried by
//! observation, handlers, and events.

use crate::chain::Chain;
use crate::coin::{Coins, Gas};
use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A transaction hash: 64 uppercase hex characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct TxId(String);

impl TxId {
    /// The blank id carried by internally initiated outbound items
    /// (migrate / ragnarok / yggdrasil funding).
    pub fn blank() -> Self {
        TxId("0".repeat(64))
    }

    /// Derive a deterministic id by hashing arbitrary input bytes.
    pub fn from_hash(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        TxId(hex::encode_upper(digest))
    }

    /// Whether the id is empty (unset).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the id is the blank internal-origin marker.
    pub fn is_blank(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c == '0')
    }

    /// The raw hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TxId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidTxId(s.to_string()));
        }
        Ok(TxId(s.to_uppercase()))
    }
}

/// A chain address. Native addresses are bech32; foreign addresses are
/// whatever the chain uses, treated as opaque strings.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Address(String);

impl Address {
    /// Wrap a raw address string. Empty strings are allowed and mean
    /// "no address"; use [`Address::is_empty`] to test.
    pub fn new(s: &str) -> Self {
        Address(s.to_string())
    }

    /// The empty address.
    pub fn none() -> Self {
        Address(String::new())
    }

    /// Whether the address is unset.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.contains(char::is_whitespace) {
            return Err(TypeError::InvalidAddress(s.to_string()));
        }
        Ok(Address(s.to_string()))
    }
}

/// A threshold-signature public key identifying a vault.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct PubKey(String);

impl PubKey {
    /// Wrap a raw public key string.
    pub fn new(s: &str) -> Self {
        PubKey(s.to_string())
    }

    /// Whether the key is unset.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the vault's address on the given chain. The derivation only
    /// needs to be deterministic and injective per (key, chain); the real
    /// encoding is the signer's concern.
    pub fn address(&self, chain: Chain) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hasher.update(chain.to_string().as_bytes());
        let digest = hasher.finalize();
        let prefix = chain.to_string().to_lowercase();
        Address(format!("{}1{}", prefix, &hex::encode(digest)[..38]))
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validator operator address on the native chain.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Wrap a raw bech32 node address.
    pub fn new(s: &str) -> Self {
        NodeAddress(s.to_string())
    }

    /// Whether the address is unset.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with("rune1") || s.len() < 10 {
            return Err(TypeError::InvalidAddress(s.to_string()));
        }
        Ok(NodeAddress(s.to_string()))
    }
}

/// A transaction witnessed on some chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Tx {
    /// Transaction hash on the originating chain.
    pub id: TxId,
    /// The chain the transaction happened on.
    pub chain: Chain,
    /// Sender address.
    pub from_address: Address,
    /// Recipient address.
    pub to_address: Address,
    /// Transferred coins.
    pub coins: Coins,
    /// Miner fee paid.
    pub gas: Gas,
    /// Attached memo string.
    pub memo: String,
}

impl Tx {
    /// Create a transaction record.
    pub fn new(
        id: TxId,
        chain: Chain,
        from_address: Address,
        to_address: Address,
        coins: Coins,
        gas: Gas,
        memo: &str,
    ) -> Self {
        Self {
            id,
            chain,
            from_address,
            to_address,
            coins,
            gas,
            memo: memo.to_string(),
        }
    }

    /// Structural validity: id, addresses and at least one non-empty coin.
    pub fn valid(&self) -> Result<(), TypeError> {
        if self.id.is_empty() {
            return Err(TypeError::InvalidTx("tx id cannot be empty".to_string()));
        }
        if self.from_address.is_empty() {
            return Err(TypeError::InvalidTx("from address cannot be empty".to_string()));
        }
        if self.to_address.is_empty() {
            return Err(TypeError::InvalidTx("to address cannot be empty".to_string()));
        }
        if self.coins.is_empty() {
            return Err(TypeError::InvalidTx("tx has no coins".to_string()));
        }
        for coin in self.coins.iter() {
            if coin.amount == 0 {
                return Err(TypeError::InvalidTx("coin amount cannot be zero".to_string()));
            }
        }
        Ok(())
    }
}

//! # Coin
//!
//! An `(asset, amount)` pair plus the `Coins` / `Gas` collections used on
//! transactions, vaults, and outbound items.

use crate::asset::Asset;
use crate::uint::safe_sub;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of a specific asset, in 1e-8 base units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// The asset.
    pub asset: Asset,
    /// The amount in base units.
    pub amount: u128,
}

impl Coin {
    /// Create a coin.
    pub fn new(asset: Asset, amount: u128) -> Self {
        Self { asset, amount }
    }

    /// A RUNE coin.
    pub fn rune(amount: u128) -> Self {
        Self::new(Asset::rune(), amount)
    }

    /// Whether the coin carries no value.
    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Whether the coin is the native settlement asset.
    pub fn is_rune(&self) -> bool {
        self.asset.is_rune()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.asset)
    }
}

/// An ordered list of coins. Ordering is by insertion; lookups are by
/// asset. Mutation keeps one entry per asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// An empty coin list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct assets held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no coins are held (zero-amount entries count as empty).
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|c| c.is_empty())
    }

    /// The held amount of the given asset, zero when absent.
    pub fn amount_of(&self, asset: &Asset) -> u128 {
        self.0
            .iter()
            .find(|c| &c.asset == asset)
            .map(|c| c.amount)
            .unwrap_or(0)
    }

    /// Whether any non-zero amount of the asset is held.
    pub fn has(&self, asset: &Asset) -> bool {
        self.amount_of(asset) > 0
    }

    /// Add an amount of an asset, merging with an existing entry.
    pub fn add(&mut self, coin: Coin) {
        if coin.is_empty() {
            return;
        }
        match self.0.iter_mut().find(|c| c.asset == coin.asset) {
            Some(existing) => existing.amount += coin.amount,
            None => self.0.push(coin),
        }
    }

    /// Subtract an amount of an asset, flooring at zero.
    pub fn sub(&mut self, coin: &Coin) {
        if let Some(existing) = self.0.iter_mut().find(|c| c.asset == coin.asset) {
            existing.amount = safe_sub(existing.amount, coin.amount);
        }
    }

    /// Iterate the coins in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    /// Iterate the coins mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Coin> {
        self.0.iter_mut()
    }

    /// First coin, if any.
    pub fn first(&self) -> Option<&Coin> {
        self.0.first()
    }
}

impl From<Vec<Coin>> for Coins {
    fn from(mut coins: Vec<Coin>) -> Self {
        coins.retain(|c| !c.asset.is_empty());
        let mut out = Coins::new();
        for coin in coins {
            out.add(coin);
        }
        out
    }
}

impl IntoIterator for Coins {
    type Item = Coin;
    type IntoIter = std::vec::IntoIter<Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Miner fees paid on a foreign chain, as a coin list.
pub type Gas = Coins;

//! # Chain
//!
//! The closed set of blockchains the network bridges. One chain is native
//! (the settlement chain that RUNE lives on); the rest are foreign chains
//! whose assets are pooled against RUNE.

use crate::asset::Asset;
use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported blockchain.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Chain {
    /// The native settlement chain.
    #[default]
    Rune,
    /// Binance chain.
    Bnb,
    /// Bitcoin.
    Btc,
    /// Ethereum.
    Eth,
}

impl Chain {
    /// All chains, native first.
    pub const ALL: [Chain; 4] = [Chain::Rune, Chain::Bnb, Chain::Btc, Chain::Eth];

    /// Whether this is the native settlement chain.
    pub fn is_native(&self) -> bool {
        matches!(self, Chain::Rune)
    }

    /// Whether the chain can carry the RUNE asset alongside pool assets, so
    /// both sides of a stake arrive in a single transaction and no
    /// pending-RUNE accumulation or separate asset address is needed.
    pub fn hosts_rune(&self) -> bool {
        matches!(self, Chain::Rune | Chain::Bnb)
    }

    /// The asset used to pay miner fees on this chain.
    pub fn gas_asset(&self) -> Asset {
        match self {
            Chain::Rune => Asset::rune(),
            Chain::Bnb => Asset::new(Chain::Bnb, "BNB"),
            Chain::Btc => Asset::new(Chain::Btc, "BTC"),
            Chain::Eth => Asset::new(Chain::Eth, "ETH"),
        }
    }

    /// Whether outbound transfers on this chain batch multiple coins into
    /// one transaction, halving the per-coin gas allowance.
    pub fn supports_multi_send(&self) -> bool {
        matches!(self, Chain::Bnb)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Chain::Rune => "RUNE",
            Chain::Bnb => "BNB",
            Chain::Btc => "BTC",
            Chain::Eth => "ETH",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Chain {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RUNE" | "THOR" => Ok(Chain::Rune),
            "BNB" => Ok(Chain::Bnb),
            "BTC" => Ok(Chain::Btc),
            "ETH" => Ok(Chain::Eth),
            _ => Err(TypeError::UnknownChain(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_chain() {
        assert!(Chain::Rune.is_native());
        assert!(!Chain::Bnb.is_native());
        assert!(!Chain::Btc.is_native());
    }

    #[test]
    fn test_gas_asset() {
        assert_eq!(Chain::Bnb.gas_asset().to_string(), "BNB.BNB");
        assert_eq!(Chain::Btc.gas_asset().to_string(), "BTC.BTC");
        assert!(Chain::Rune.gas_asset().is_rune());
    }

    #[test]
    fn test_parse_chain() {
        assert_eq!("bnb".parse::<Chain>().unwrap(), Chain::Bnb);
        assert_eq!("BTC".parse::<Chain>().unwrap(), Chain::Btc);
        assert!("DOGE".parse::<Chain>().is_err());
    }

    #[test]
    fn test_multi_send() {
        assert!(Chain::Bnb.supports_multi_send());
        assert!(!Chain::Btc.supports_multi_send());
    }
}

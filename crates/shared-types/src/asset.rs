//! # Asset
//!
//! An asset is a `{chain, symbol, ticker}` tuple. The symbol may carry a
//! chain-specific suffix (`RUNE-B1A`); the ticker is the symbol with the
//! suffix stripped. The distinguished native asset RUNE is the numeraire
//! for every pool.

use crate::chain::Chain;
use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A chain-qualified asset.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// The chain the asset lives on.
    pub chain: Chain,
    /// Full symbol, including any issuance suffix.
    pub symbol: String,
    /// Symbol with the suffix stripped.
    pub ticker: String,
}

impl Asset {
    /// Create an asset from a chain and symbol; the ticker is derived.
    pub fn new(chain: Chain, symbol: &str) -> Self {
        let symbol = symbol.to_uppercase();
        let ticker = symbol.split('-').next().unwrap_or_default().to_string();
        Self {
            chain,
            symbol,
            ticker,
        }
    }

    /// The native settlement asset.
    pub fn rune() -> Self {
        Asset::new(Chain::Rune, "RUNE")
    }

    /// Whether this asset is RUNE (on any chain that hosts it).
    pub fn is_rune(&self) -> bool {
        self.ticker == "RUNE"
    }

    /// Whether this asset pays miner fees on its chain.
    pub fn is_gas_asset(&self) -> bool {
        *self == self.chain.gas_asset()
    }

    /// Whether the asset is structurally empty.
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }
}

impl Default for Asset {
    fn default() -> Self {
        Asset::rune()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.chain, self.symbol)
    }
}

impl FromStr for Asset {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("RUNE") {
            return Ok(Asset::rune());
        }
        let (chain, symbol) = s
            .split_once('.')
            .ok_or_else(|| TypeError::InvalidAsset(s.to_string()))?;
        if symbol.is_empty() {
            return Err(TypeError::InvalidAsset(s.to_string()));
        }
        let chain = chain
            .parse::<Chain>()
            .map_err(|_| TypeError::InvalidAsset(s.to_string()))?;
        Ok(Asset::new(chain, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asset() {
        let asset = "BNB.RUNE-B1A".parse::<Asset>().unwrap();
        assert_eq!(asset.chain, Chain::Bnb);
        assert_eq!(asset.symbol, "RUNE-B1A");
        assert_eq!(asset.ticker, "RUNE");
        assert!(asset.is_rune());
    }

    #[test]
    fn test_parse_rune_shorthand() {
        let asset = "RUNE".parse::<Asset>().unwrap();
        assert!(asset.is_rune());
        assert_eq!(asset.chain, Chain::Rune);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<Asset>().is_err());
        assert!("BNB".parse::<Asset>().is_err());
        assert!("BNB.".parse::<Asset>().is_err());
        assert!("XXX.XXX".parse::<Asset>().is_err());
    }

    #[test]
    fn test_gas_asset() {
        let bnb = Asset::new(Chain::Bnb, "BNB");
        assert!(bnb.is_gas_asset());
        let lok = Asset::new(Chain::Bnb, "LOK-3C0");
        assert!(!lok.is_gas_asset());
    }

    #[test]
    fn test_display_round_trip() {
        let asset = Asset::new(Chain::Btc, "BTC");
        assert_eq!(asset.to_string().parse::<Asset>().unwrap(), asset);
    }
}

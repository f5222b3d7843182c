//! # Memo
//!
//! The tagged memo value and its parser.

use crate::errors::MemoError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Asset, NodeAddress, TxId};
use std::fmt;
use std::str::FromStr;

const MAX_BASIS_POINTS: u64 = 10_000;

/// A decoded memo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Memo {
    /// Provide liquidity to a pool.
    Stake {
        /// The pool asset.
        asset: Asset,
        /// The staker's address on the chain the deposit did not arrive
        /// on, pairing the two halves of a cross-chain stake. Empty only
        /// when the asset chain also hosts RUNE (one tx carries both
        /// sides).
        address: Address,
    },
    /// Withdraw liquidity.
    Unstake {
        /// The pool asset.
        asset: Asset,
        /// Fraction to withdraw, in basis points (1..=10000).
        basis_points: u64,
    },
    /// Exchange one asset for another.
    Swap {
        /// The target asset.
        asset: Asset,
        /// Destination address; empty means "back to the sender".
        destination: Address,
        /// Minimum acceptable output; zero disables the check.
        slip_limit: u128,
    },
    /// Donate to a pool without receiving units.
    Add {
        /// The pool asset.
        asset: Asset,
    },
    /// Acknowledge a scheduled outbound.
    Outbound {
        /// The inbound tx the outbound answers.
        tx_id: TxId,
    },
    /// Acknowledge a refund.
    Refund {
        /// The refunded inbound tx.
        tx_id: TxId,
    },
    /// Bond RUNE to a node account.
    Bond {
        /// The node to credit.
        node_address: NodeAddress,
    },
    /// Request voluntary exit from the validator set.
    Leave,
    /// Fund a yggdrasil vault.
    YggdrasilFund {
        /// Height the funding was scheduled at.
        block_height: u64,
    },
    /// Return yggdrasil funds to asgard.
    YggdrasilReturn {
        /// Height the return was demanded at.
        block_height: u64,
    },
    /// Contribute to the protocol reserve.
    Reserve,
    /// Move funds between asgard vaults during rotation.
    Migrate {
        /// Height the migration was scheduled at.
        block_height: u64,
    },
    /// Return funds during protocol teardown.
    Ragnarok {
        /// Height the teardown round was scheduled at.
        block_height: u64,
    },
    /// Convert a foreign representation of RUNE to native.
    Switch {
        /// Native destination address.
        destination: Address,
    },
    /// Explicit no-op.
    NoOp,
}

impl Memo {
    /// Whether the memo was produced by the network itself.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Memo::YggdrasilFund { .. }
                | Memo::YggdrasilReturn { .. }
                | Memo::Migrate { .. }
                | Memo::Ragnarok { .. }
        )
    }

    /// Whether the memo is a user-initiated inbound intent.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            Memo::Stake { .. }
                | Memo::Unstake { .. }
                | Memo::Swap { .. }
                | Memo::Add { .. }
                | Memo::Bond { .. }
                | Memo::Leave
                | Memo::Reserve
                | Memo::Switch { .. }
        )
    }

    /// Whether the memo acknowledges an outbound leg.
    pub fn is_outbound(&self) -> bool {
        matches!(self, Memo::Outbound { .. } | Memo::Refund { .. })
    }

    /// The inbound tx id carried by outbound / refund memos.
    pub fn tx_id(&self) -> Option<&TxId> {
        match self {
            Memo::Outbound { tx_id } | Memo::Refund { tx_id } => Some(tx_id),
            _ => None,
        }
    }
}

impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Memo::Stake {
                asset,
                address,
            } => {
                if address.is_empty() {
                    write!(f, "STAKE:{asset}")
                } else {
                    write!(f, "STAKE:{asset}:{address}")
                }
            }
            Memo::Unstake {
                asset,
                basis_points,
            } => write!(f, "WITHDRAW:{asset}:{basis_points}"),
            Memo::Swap {
                asset,
                destination,
                slip_limit,
            } => write!(f, "SWAP:{asset}:{destination}:{slip_limit}"),
            Memo::Add { asset } => write!(f, "ADD:{asset}"),
            Memo::Outbound { tx_id } => write!(f, "OUTBOUND:{tx_id}"),
            Memo::Refund { tx_id } => write!(f, "REFUND:{tx_id}"),
            Memo::Bond { node_address } => write!(f, "BOND:{node_address}"),
            Memo::Leave => write!(f, "LEAVE"),
            Memo::YggdrasilFund { block_height } => write!(f, "YGGDRASIL+:{block_height}"),
            Memo::YggdrasilReturn { block_height } => write!(f, "YGGDRASIL-:{block_height}"),
            Memo::Reserve => write!(f, "RESERVE"),
            Memo::Migrate { block_height } => write!(f, "MIGRATE:{block_height}"),
            Memo::Ragnarok { block_height } => write!(f, "RAGNAROK:{block_height}"),
            Memo::Switch { destination } => write!(f, "SWITCH:{destination}"),
            Memo::NoOp => write!(f, "NOOP"),
        }
    }
}

impl FromStr for Memo {
    type Err = MemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(MemoError::Empty);
        }
        let parts: Vec<&str> = s.split(':').collect();
        let kind = parts[0].to_lowercase();
        let arg = |i: usize| parts.get(i).copied().filter(|p| !p.is_empty());

        match kind.as_str() {
            "stake" | "st" | "+" => {
                let asset = parse_asset(arg(1))?;
                let address = match arg(2) {
                    Some(raw) => parse_address(raw)?,
                    None => {
                        if !asset.chain.hosts_rune() {
                            return Err(MemoError::StakeAddressRequired(asset.chain.to_string()));
                        }
                        Address::none()
                    }
                };
                Ok(Memo::Stake {
                    asset,
                    address,
                })
            }
            "unstake" | "withdraw" | "wd" | "-" => {
                let asset = parse_asset(arg(1))?;
                let basis_points = match arg(2) {
                    Some(raw) => {
                        let bp: u64 = raw
                            .parse()
                            .map_err(|_| MemoError::InvalidBasisPoints(raw.to_string()))?;
                        if bp == 0 || bp > MAX_BASIS_POINTS {
                            return Err(MemoError::InvalidBasisPoints(raw.to_string()));
                        }
                        bp
                    }
                    None => MAX_BASIS_POINTS,
                };
                Ok(Memo::Unstake {
                    asset,
                    basis_points,
                })
            }
            "swap" | "s" | "=" => {
                let asset = parse_asset(arg(1))?;
                let destination = match arg(2) {
                    Some(raw) => parse_address(raw)?,
                    None => Address::none(),
                };
                let slip_limit = match arg(3) {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| MemoError::InvalidNumber(raw.to_string()))?,
                    None => 0,
                };
                Ok(Memo::Swap {
                    asset,
                    destination,
                    slip_limit,
                })
            }
            "add" | "a" | "%" => Ok(Memo::Add {
                asset: parse_asset(arg(1))?,
            }),
            "outbound" => Ok(Memo::Outbound {
                tx_id: parse_tx_id(arg(1))?,
            }),
            "refund" => Ok(Memo::Refund {
                tx_id: parse_tx_id(arg(1))?,
            }),
            "bond" => {
                let raw = arg(1).ok_or(MemoError::MissingField("node address"))?;
                let node_address = raw
                    .parse::<NodeAddress>()
                    .map_err(|_| MemoError::InvalidAddress(raw.to_string()))?;
                Ok(Memo::Bond { node_address })
            }
            "leave" => Ok(Memo::Leave),
            "yggdrasil+" => Ok(Memo::YggdrasilFund {
                block_height: parse_height(arg(1))?,
            }),
            "yggdrasil-" => Ok(Memo::YggdrasilReturn {
                block_height: parse_height(arg(1))?,
            }),
            "reserve" => Ok(Memo::Reserve),
            "migrate" => Ok(Memo::Migrate {
                block_height: parse_height(arg(1))?,
            }),
            "ragnarok" => Ok(Memo::Ragnarok {
                block_height: parse_height(arg(1))?,
            }),
            "switch" => {
                let raw = arg(1).ok_or(MemoError::MissingField("destination"))?;
                Ok(Memo::Switch {
                    destination: parse_address(raw)?,
                })
            }
            "noop" => Ok(Memo::NoOp),
            _ => Err(MemoError::UnknownType(parts[0].to_string())),
        }
    }
}

fn parse_asset(raw: Option<&str>) -> Result<Asset, MemoError> {
    let raw = raw.ok_or(MemoError::MissingField("asset"))?;
    raw.parse()
        .map_err(|_| MemoError::InvalidAsset(raw.to_string()))
}

fn parse_address(raw: &str) -> Result<Address, MemoError> {
    raw.parse()
        .map_err(|_| MemoError::InvalidAddress(raw.to_string()))
}

fn parse_tx_id(raw: Option<&str>) -> Result<TxId, MemoError> {
    let raw = raw.ok_or(MemoError::MissingField("tx id"))?;
    raw.parse()
        .map_err(|_| MemoError::InvalidTxId(raw.to_string()))
}

fn parse_height(raw: Option<&str>) -> Result<u64, MemoError> {
    let raw = raw.ok_or(MemoError::MissingField("block height"))?;
    raw.parse()
        .map_err(|_| MemoError::InvalidNumber(raw.to_string()))
}

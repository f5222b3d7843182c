//! # Node account
//!
//! A bonded validator-observer. Status transitions form a DAG:
//! WhiteListed → Standby → Ready → Active → (Standby | Disabled).
//! Slash points accrue during Active and reset on entry to Active.

use crate::errors::TypeError;
use crate::tx::{Address, NodeAddress, PubKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Registered but not yet bonded for rotation.
    #[default]
    WhiteListed,
    /// Bonded, waiting to be marked ready.
    Standby,
    /// Eligible for the next rotation.
    Ready,
    /// In the signing set; observing and custodying.
    Active,
    /// Removed permanently.
    Disabled,
}

impl NodeStatus {
    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: NodeStatus) -> bool {
        use NodeStatus::*;
        matches!(
            (self, next),
            (WhiteListed, Standby)
                | (Standby, Ready)
                | (Standby, Standby)
                | (Ready, Active)
                | (Ready, Standby)
                | (Active, Standby)
                | (Active, Disabled)
        )
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::WhiteListed => "WhiteListed",
            NodeStatus::Standby => "Standby",
            NodeStatus::Ready => "Ready",
            NodeStatus::Active => "Active",
            NodeStatus::Disabled => "Disabled",
        };
        write!(f, "{s}")
    }
}

/// A semantic version carried by each node; handler dispatch is gated on
/// the minimum version across the active set.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version {
    /// Breaking-change counter.
    pub major: u64,
    /// Feature counter.
    pub minor: u64,
    /// Fix counter.
    pub patch: u64,
}

impl Version {
    /// Construct a version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = || -> Result<u64, TypeError> {
            parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| TypeError::InvalidVersion(s.to_string()))
        };
        let version = Version::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(TypeError::InvalidVersion(s.to_string()));
        }
        Ok(version)
    }
}

/// The public keys registered by a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePubKeys {
    /// Key the node signs witness messages with.
    pub node_pub_key: PubKey,
    /// Consensus-engine key for the validator set.
    pub validator_cons_pub_key: PubKey,
}

/// A node account record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAccount {
    /// Operator address on the native chain.
    pub node_address: NodeAddress,
    /// Lifecycle status.
    pub status: NodeStatus,
    /// Registered public keys.
    pub pub_key_set: NodePubKeys,
    /// Escrowed RUNE collateral.
    pub bond: u128,
    /// Address the bond was sent from, and is refunded to.
    pub bond_address: Address,
    /// Height the node entered its current status.
    pub status_since: u64,
    /// Height the node last entered Active; basis of reward accrual.
    pub active_block_height: u64,
    /// Misbehavior points accrued while Active.
    pub slash_points: u64,
    /// Height at which the node was scheduled to leave.
    pub leave_height: u64,
    /// Whether the operator asked to leave voluntarily.
    pub requested_to_leave: bool,
    /// Whether the network forced the node out.
    pub forced_to_leave: bool,
    /// Software version the node reported.
    pub version: Version,
}

impl NodeAccount {
    /// Create a node account in the given status.
    pub fn new(
        node_address: NodeAddress,
        status: NodeStatus,
        pub_key_set: NodePubKeys,
        bond: u128,
        bond_address: Address,
        height: u64,
    ) -> Self {
        let mut na = NodeAccount {
            node_address,
            pub_key_set,
            bond,
            bond_address,
            // a fresh node speaks the genesis protocol version until it
            // reports otherwise
            version: Version::new(0, 1, 0),
            ..Default::default()
        };
        na.update_status(status, height);
        na
    }

    /// Whether the node is in the active signing set.
    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }

    /// Whether the node is empty (unregistered).
    pub fn is_empty(&self) -> bool {
        self.node_address.is_empty()
    }

    /// Move the node to a new status, maintaining the bookkeeping fields.
    /// Entry into Active resets slash points and stamps the activation
    /// height.
    pub fn update_status(&mut self, status: NodeStatus, height: u64) {
        if status == NodeStatus::Active && self.status != NodeStatus::Active {
            self.active_block_height = height;
            self.slash_points = 0;
        }
        self.status = status;
        self.status_since = height;
    }

    /// Credit slash points.
    pub fn add_slash_points(&mut self, points: u64) {
        self.slash_points = self.slash_points.saturating_add(points);
    }
}

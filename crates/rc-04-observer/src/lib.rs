//! # RC-04 Observer Voter
//!
//! Supermajority consensus over foreign-chain witnesses.
//!
//! Active nodes submit `ObservedTxIn` / `ObservedTxOut` witnesses; the
//! voter tracks each distinct reported content separately (byzantine
//! observers may disagree) and acts once `ceil(2n/3)` of the active set
//! signed one version. Errata votes retroactively reverse the pool effects
//! of an observed tx that turned out to be invalid.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errata;
pub mod errors;
pub mod voting;

pub use errata::{apply_errata, ErrataOutcome};
pub use errors::ObserverError;
pub use voting::{add_observed_tx, VoteOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

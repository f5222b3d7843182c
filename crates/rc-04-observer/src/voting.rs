//! The witness voting step shared by inbound and outbound observation.

use crate::errors::ObserverError;
use rc_02_keeper::Keeper;
use shared_types::{NodeAddress, ObservedTx};
use tracing::{debug, info};

/// What a witness submission did to the voter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Recorded; consensus not reached yet.
    Pending,
    /// This witness tipped the voter over the supermajority threshold.
    /// Carries the agreed content; the caller acts on its memo now.
    Consensus(ObservedTx),
    /// Consensus had already formed earlier; the vote was bookkeeping
    /// only (the voter height never changes again).
    AlreadyFinalized,
}

/// Record one witness: bucket it by content, add the signer, persist, and
/// report whether consensus just formed. Also maintains the per-chain
/// height watermark, the observed gas price, and the per-block observing
/// set used by the slasher.
pub fn add_observed_tx(
    keeper: &mut Keeper,
    observed: ObservedTx,
    signer: NodeAddress,
    active_nodes: usize,
    height: u64,
) -> Result<VoteOutcome, ObserverError> {
    observed
        .tx
        .valid()
        .map_err(|e| ObserverError::Validation(e.to_string()))?;
    if observed.observed_pub_key.is_empty() {
        return Err(ObserverError::Validation(
            "observed pub key is empty".to_string(),
        ));
    }

    keeper.add_observing_addresses(&[signer.clone()])?;
    keeper.set_last_chain_height(observed.tx.chain, observed.block_height)?;
    for gas_coin in observed.tx.gas.iter() {
        keeper.set_gas(&gas_coin.asset, gas_coin.amount)?;
    }

    let mut voter = keeper.get_observed_tx_voter(&observed.tx.id)?;
    let changed = voter.add(observed, signer.clone());
    if !changed {
        // replay of an already-recorded witness is a no-op
        debug!(signer = %signer, tx_id = %voter.tx_id, "duplicate witness ignored");
        keeper.set_observed_tx_voter(&voter)?;
        return Ok(if voter.height > 0 {
            VoteOutcome::AlreadyFinalized
        } else {
            VoteOutcome::Pending
        });
    }

    if voter.height > 0 {
        keeper.set_observed_tx_voter(&voter)?;
        return Ok(VoteOutcome::AlreadyFinalized);
    }

    let outcome = match voter.consensus_tx(active_nodes) {
        Some(tx) => {
            let tx = tx.clone();
            voter.height = height;
            info!(tx_id = %voter.tx_id, height, "witness consensus reached");
            VoteOutcome::Consensus(tx)
        }
        None => VoteOutcome::Pending,
    };
    keeper.set_observed_tx_voter(&voter)?;
    Ok(outcome)
}

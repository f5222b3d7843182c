//! Validator set management: readiness, churn selection, rotation.

use crate::errors::ValidatorError;
use rc_02_keeper::Keeper;
use rc_05_vaults::VaultMgr;
use rc_08_rewards::pay_node_bond_award;
use shared_types::{Constants, NodeAccount, NodeStatus, PubKey};
use tracing::{debug, info};

/// A power change handed back to the host consensus engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorUpdate {
    /// The node's consensus pubkey.
    pub pub_key: PubKey,
    /// Voting power; zero removes the validator.
    pub power: u64,
}

/// Drives node status transitions and churn.
pub struct ValidatorMgr;

impl ValidatorMgr {
    /// BeginBlock: refresh Standby nodes to Ready where eligible, and
    /// check the operator teardown switch.
    pub fn begin_block(
        keeper: &mut Keeper,
        _constants: &Constants,
        height: u64,
    ) -> Result<(), ValidatorError> {
        // operator-triggered teardown
        if let Some(flag) =
            keeper.get_mimir(shared_types::constants::mimir_keys::RAGNAROK)?
        {
            if flag > 0 {
                keeper.set_ragnarok_height(height)?;
            }
        }
        Self::mark_ready_actors(keeper, height)?;
        Ok(())
    }

    /// Standby nodes become Ready when they carry a bond, registered
    /// keys, and a version at least the minimum active version.
    fn mark_ready_actors(keeper: &mut Keeper, height: u64) -> Result<(), ValidatorError> {
        let min_version = keeper.get_min_active_version()?;
        for mut na in keeper.list_node_accounts_by_status(NodeStatus::Standby)? {
            let ready = na.bond > 0
                && !na.pub_key_set.node_pub_key.is_empty()
                && !na.requested_to_leave
                && !na.forced_to_leave
                && na.version >= min_version;
            if ready {
                na.update_status(NodeStatus::Ready, height);
                keeper.set_node_account(&na)?;
                debug!(node = %na.node_address, "node ready");
            }
        }
        // demote ready nodes that no longer qualify
        for mut na in keeper.list_node_accounts_by_status(NodeStatus::Ready)? {
            let still_ready = na.bond > 0
                && !na.requested_to_leave
                && !na.forced_to_leave
                && na.version >= min_version;
            if !still_ready {
                na.update_status(NodeStatus::Standby, height);
                keeper.set_node_account(&na)?;
            }
        }
        Ok(())
    }

    /// The active node with the worst behavior-per-tenure ratio:
    /// smallest `status_since / slash_points`, ties broken by the higher
    /// slash count.
    pub fn find_bad_actor(keeper: &Keeper) -> Result<Option<NodeAccount>, ValidatorError> {
        let mut worst: Option<(u128, u64, NodeAccount)> = None;
        for na in keeper.list_active_node_accounts()? {
            if na.slash_points == 0 {
                continue;
            }
            // scale before dividing so short tenures don't all collapse
            // to zero
            let rank = (na.status_since as u128 * 1_000_000) / na.slash_points as u128;
            let candidate = (rank, na.slash_points, na);
            worst = match worst {
                None => Some(candidate),
                Some(current) => {
                    let beats = candidate.0 < current.0
                        || (candidate.0 == current.0 && candidate.1 > current.1);
                    if beats {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        Ok(worst.map(|(_, _, na)| na))
    }

    /// The longest-serving active node.
    pub fn find_old_actor(keeper: &Keeper) -> Result<Option<NodeAccount>, ValidatorError> {
        Ok(keeper
            .list_active_node_accounts()?
            .into_iter()
            .min_by_key(|na| (na.status_since, na.node_address.clone())))
    }

    /// Mark a node to leave at the next churn.
    pub fn mark_actor(
        keeper: &mut Keeper,
        mut na: NodeAccount,
        height: u64,
    ) -> Result<(), ValidatorError> {
        if na.leave_height == 0 {
            info!(node = %na.node_address, "marked to churn out");
            na.leave_height = height;
            keeper.set_node_account(&na)?;
        }
        Ok(())
    }

    /// The member set for the next vault, and whether it differs from the
    /// current active set.
    ///
    /// Ordering rules: actives sorted by ascending `leave_height` (the
    /// head churns out when marked or leaving), ready nodes sorted by
    /// descending bond fill vacancies, at most two additions per
    /// rotation.
    pub fn next_vault_node_accounts(
        keeper: &mut Keeper,
        constants: &Constants,
        height: u64,
    ) -> Result<(Vec<NodeAccount>, bool), ValidatorError> {
        // nominate churn candidates first
        if let Some(bad) = Self::find_bad_actor(keeper)? {
            Self::mark_actor(keeper, bad, height)?;
        }
        if let Some(old) = Self::find_old_actor(keeper)? {
            Self::mark_actor(keeper, old, height)?;
        }

        let mut actives = keeper.list_active_node_accounts()?;
        actives.sort_by_key(|na| (na.leave_height, na.node_address.clone()));

        let mut rotating_out = false;
        let mut next: Vec<NodeAccount> = Vec::new();
        for (i, na) in actives.iter().enumerate() {
            let churn_out =
                i == 0 && (na.leave_height > 0 || na.requested_to_leave || na.forced_to_leave);
            if churn_out {
                rotating_out = true;
                info!(node = %na.node_address, "churning out");
                continue;
            }
            next.push(na.clone());
        }

        let mut ready = keeper.list_node_accounts_by_status(NodeStatus::Ready)?;
        ready.sort_by(|a, b| {
            b.bond
                .cmp(&a.bond)
                .then_with(|| a.node_address.cmp(&b.node_address))
        });

        let target_set = keeper.constant_or_mimir(
            shared_types::constants::mimir_keys::DESIRE_VALIDATOR_SET,
            constants.desire_validator_set as u128,
        )? as usize;
        let mut added = 0usize;
        for na in ready {
            if next.len() >= target_set {
                break;
            }
            if added >= constants.validator_rotate_in_num_before_full {
                break;
            }
            next.push(na);
            added += 1;
        }

        let changed = rotating_out || added > 0;
        Ok((next, changed))
    }

    /// EndBlock: on a rotation boundary, compute the next member set and
    /// request a keygen when it changed. Returns validator-set updates
    /// reflecting status changes applied this block.
    pub fn end_block(
        keeper: &mut Keeper,
        constants: &Constants,
        height: u64,
    ) -> Result<Vec<ValidatorUpdate>, ValidatorError> {
        let rotate = keeper.constant_or_mimir(
            shared_types::constants::mimir_keys::ROTATE_PER_BLOCK_HEIGHT,
            constants.rotate_per_block_height as u128,
        )? as u64;
        if rotate > 0 && height % rotate == 0 && height > 0 {
            let (next, changed) = Self::next_vault_node_accounts(keeper, constants, height)?;
            if changed && !next.is_empty() {
                VaultMgr::trigger_keygen(keeper, height, &next)?;
            }
        }
        Ok(Vec::new())
    }

    /// Apply a successful keygen: the member set becomes Active, everyone
    /// else active leaves with their bond award paid.
    pub fn rotate_validator_set(
        keeper: &mut Keeper,
        members: &[PubKey],
        height: u64,
    ) -> Result<Vec<ValidatorUpdate>, ValidatorError> {
        let mut updates = Vec::new();
        let actives = keeper.list_active_node_accounts()?;

        // members in: Ready (or Standby) nodes named in the new vault
        for na in keeper.list_node_accounts()? {
            let is_member = members.contains(&na.pub_key_set.node_pub_key);
            let was_active = na.status == NodeStatus::Active;
            if is_member && !was_active {
                let mut na = na;
                na.update_status(NodeStatus::Active, height);
                keeper.set_node_account(&na)?;
                updates.push(ValidatorUpdate {
                    pub_key: na.pub_key_set.validator_cons_pub_key.clone(),
                    power: 100,
                });
                info!(node = %na.node_address, "node activated");
            }
        }

        // members out: actives not in the new set leave and collect
        // their accrued bond reward
        for na in actives {
            if members.contains(&na.pub_key_set.node_pub_key) {
                continue;
            }
            let mut na = na;
            pay_node_bond_award(keeper, &mut na, height)?;
            let next_status = if na.forced_to_leave {
                NodeStatus::Disabled
            } else {
                NodeStatus::Standby
            };
            na.update_status(next_status, height);
            na.leave_height = 0;
            na.requested_to_leave = false;
            keeper.set_node_account(&na)?;
            updates.push(ValidatorUpdate {
                pub_key: na.pub_key_set.validator_cons_pub_key.clone(),
                power: 0,
            });
            info!(node = %na.node_address, status = %na.status, "node deactivated");
        }
        Ok(updates)
    }
}

//! The block loop.

use crate::genesis::GenesisConfig;
use rc_02_keeper::{Keeper, KeeperError, MemoryStore};
use rc_05_vaults::{fund_yggdrasils, process_ragnarok, VaultMgr};
use rc_06_txout::TxOutStore;
use rc_07_swap_queue::SwapQueue;
use rc_08_rewards::update_vault_data;
use rc_09_validators::{Slasher, ValidatorMgr, ValidatorUpdate};
use rc_10_handlers::{HandlerCtx, HandlerResult, Msg, Router};
use shared_types::{Constants, TxOut};
use tracing::{error, info, warn};

/// The replicated state machine, executed in lock-step on every
/// validator.
pub struct RuneNode {
    keeper: Keeper,
    txout: TxOutStore,
    constants: Constants,
    height: u64,
}

impl RuneNode {
    /// A node over an empty in-memory store.
    pub fn new(constants: Constants) -> Self {
        Self {
            keeper: Keeper::new(Box::new(MemoryStore::new())),
            txout: TxOutStore::new(),
            constants,
            height: 0,
        }
    }

    /// Apply genesis state. Call once before the first block.
    pub fn init_chain(&mut self, genesis: &GenesisConfig) -> Result<(), KeeperError> {
        genesis.apply(&mut self.keeper)
    }

    /// State access for queries and tests.
    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    /// Mutable state access for the host's own bookkeeping.
    pub fn keeper_mut(&mut self) -> &mut Keeper {
        &mut self.keeper
    }

    /// The height currently executing.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Begin a block.
    pub fn begin_block(&mut self, height: u64) -> Result<(), KeeperError> {
        self.height = height;
        self.txout.new_block(height);
        if let Err(e) = ValidatorMgr::begin_block(&mut self.keeper, &self.constants, height) {
            warn!(error = %e, "begin block validator pass failed");
        }
        Ok(())
    }

    /// Deliver one message inside its own transaction boundary: a
    /// rejected message leaves no partial writes.
    pub fn deliver_msg(&mut self, msg: Msg) -> HandlerResult {
        self.keeper.begin_tx();
        let mut ctx = HandlerCtx {
            keeper: &mut self.keeper,
            txout: &self.txout,
            constants: &self.constants,
            height: self.height,
        };
        let result = Router::handle(&mut ctx, msg);
        if result.is_ok() {
            self.keeper.commit_tx();
        } else {
            self.keeper.rollback_tx();
        }
        result
    }

    /// End the block: slash, drain swaps, run vault accounting, pay
    /// rewards, seal the outbound batch, and emit validator updates.
    ///
    /// Stage errors are logged and skipped; only storage errors
    /// propagate (the host replays the block).
    pub fn end_block(&mut self) -> Result<(Vec<ValidatorUpdate>, TxOut), KeeperError> {
        let height = self.height;

        if let Err(e) = Slasher::lack_observing(&mut self.keeper, &self.constants) {
            error!(error = %e, "lack-of-observing slash failed");
        }
        if let Err(e) =
            Slasher::lack_signing(&mut self.keeper, &self.txout, &self.constants, height)
        {
            error!(error = %e, "lack-of-signing slash failed");
        }

        if let Err(e) =
            SwapQueue::end_block(&mut self.keeper, &self.txout, &self.constants, height)
        {
            error!(error = %e, "swap queue drain failed");
        }

        if let Err(e) = VaultMgr::end_block(&mut self.keeper, &self.txout, &self.constants, height)
        {
            error!(error = %e, "vault manager failed");
        }
        if let Err(e) =
            fund_yggdrasils(&mut self.keeper, &self.txout, &self.constants, height)
        {
            error!(error = %e, "yggdrasil funding failed");
        }
        if let Err(e) =
            process_ragnarok(&mut self.keeper, &self.txout, &self.constants, height)
        {
            error!(error = %e, "ragnarok processing failed");
        }

        if let Err(e) = update_vault_data(&mut self.keeper, &self.constants, height) {
            error!(error = %e, "reward distribution failed");
        }

        let updates = match ValidatorMgr::end_block(&mut self.keeper, &self.constants, height) {
            Ok(updates) => updates,
            Err(e) => {
                error!(error = %e, "validator manager failed");
                Vec::new()
            }
        };

        // seal the outbound batch for the signers
        let batch = self.keeper.get_txout(height)?;
        if !batch.is_empty() {
            info!(height, outbound = batch.tx_array.len(), "block sealed");
        }
        Ok((updates, batch))
    }
}

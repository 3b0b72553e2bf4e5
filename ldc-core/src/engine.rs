//! All-or-nothing transaction application over a [`ChainState`].
//!
//! [`LedgerEngine::apply`] runs one transaction through its handler and
//! either commits every touched account or reverts all of them, so a
//! rejected transaction leaves no trace in state.

use ldc_common::prelude::*;
use ldc_state::ChainState;
use ldc_transaction::{new_handler, BlockContext, Transaction};
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use tracing::{info, warn};

use crate::config::LedgerConfig;

/// Outcome of a committed transaction
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    /// Hex SHA-256 of the transaction
    pub id: String,
    pub kind: TxKind,
    pub from: Address,
    pub nonce: u64,
    /// Gas charged to the sender
    #[serde_as(as = "DisplayFromStr")]
    pub cost: Amount,
}

/// Applied/rejected counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub applied: u64,
    pub rejected: u64,
}

pub struct LedgerEngine<S: ChainState> {
    ctx: BlockContext,
    state: S,
    stats: EngineStats,
}

impl<S: ChainState> LedgerEngine<S> {
    pub fn new(ctx: BlockContext, state: S) -> Self {
        Self {
            ctx,
            state,
            stats: EngineStats::default(),
        }
    }

    pub fn from_config(cfg: &LedgerConfig, state: S) -> LedgerResult<Self> {
        cfg.validate()?;
        Ok(Self::new(cfg.block_context()?, state))
    }

    pub fn context(&self) -> &BlockContext {
        &self.ctx
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Applies `tx`, committing on success and reverting on any failure.
    pub fn apply(&mut self, tx: Transaction) -> LedgerResult<TxReceipt> {
        let id = tx.id_hex()?;
        let (kind, from, nonce) = (tx.kind, tx.from, tx.nonce);

        let mut handler = new_handler(tx);
        let result = match handler.syntactic_verify() {
            Ok(()) => handler.apply(&self.ctx, &mut self.state),
            Err(err) => Err(err),
        };
        let result = result.and_then(|()| self.state.commit());

        match result {
            Ok(()) => {
                self.stats.applied += 1;
                let receipt = TxReceipt {
                    id,
                    kind,
                    from,
                    nonce,
                    cost: handler.base().cost(),
                };
                info!(tx = %receipt.id, %kind, %from, nonce, cost = %receipt.cost, "transaction applied");
                Ok(receipt)
            }
            Err(err) => {
                self.state.revert();
                self.stats.rejected += 1;
                warn!(tx = %id, %kind, %from, nonce, error_kind = ?err.kind(), error = %err, "transaction rejected");
                Err(err)
            }
        }
    }

    /// Applies transactions in order; a rejection does not stop the batch.
    pub fn apply_all(
        &mut self,
        txs: impl IntoIterator<Item = Transaction>,
    ) -> Vec<LedgerResult<TxReceipt>> {
        txs.into_iter().map(|tx| self.apply(tx)).collect()
    }
}

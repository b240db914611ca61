/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2023 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::sync::Arc;

use futures::future::{self, Either};

use crate::cancel::CancelToken;
use crate::collaborators::{Ledger, LedgerProof, ProvingBackend, Statement, Transaction};
use crate::hash::Hash;

/// Applies `txs` to a snapshot of `ledger` and returns the resulting hash
/// together with the post-application ledger, or the first error
/// `Ledger::apply` raises.
fn apply_all<L: Ledger>(ledger: &L, txs: &[Transaction]) -> (Hash, Result<L, crate::error::ConsensusError>) {
    let mut applied = ledger.snapshot();
    for tx in txs {
        if let Err(e) = applied.apply(tx) {
            return (applied.hash(), Err(e));
        }
    }
    let hash = applied.hash();
    (hash, Ok(applied))
}

/// A handle to an in-flight bundle build (spec.md section 4.1).
pub struct BundleHandle {
    target_hash: Hash,
    cancel: CancelToken,
    task: smol::Task<Option<LedgerProof>>,
}

impl BundleHandle {
    pub fn target_hash(&self) -> Hash {
        self.target_hash
    }

    /// A clone of the handle's cancellation token, so a caller can keep the
    /// ability to cancel after moving the handle itself into a `result()` await.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Resolves once the proof completes; `None` iff proving failed or was
    /// cancelled.
    pub async fn result(self) -> Option<LedgerProof> {
        self.task.await
    }

    /// Idempotent; causes `result()` to resolve to `None` if not yet
    /// resolved.
    pub fn cancel(&self) {
        self.cancel.cancel()
    }
}

/// Builds a bundle: executes `txs` against `ledger` and asynchronously
/// proves the resulting transition (spec.md section 4.1, "Bundle builder").
///
/// `target_hash()` is available synchronously from the returned handle,
/// since it only depends on deterministically applying `txs` to `ledger`.
pub fn build<L, PB>(ledger: &L, txs: Vec<Transaction>, proving: Arc<PB>) -> BundleHandle
where
    L: Ledger,
    PB: ProvingBackend,
{
    let from_ledger_hash = ledger.hash();
    let (target_hash, applied) = apply_all(ledger, &txs);
    let cancel = CancelToken::new();
    let task_cancel = cancel.clone();

    let statement = Statement { from_ledger_hash, to_ledger_hash: target_hash, transactions: txs };
    let apply_failed = applied.is_err();

    let task = smol::spawn(async move {
        if apply_failed {
            log::debug!(target: "consensus_core::bundle", "bundle build failed: ledger rejected a transaction");
            return None;
        }
        if task_cancel.is_cancelled() {
            log::debug!(target: "consensus_core::bundle", "bundle build cancelled before proving started");
            return None;
        }

        let prove_fut = Box::pin(async {
            match proving.prove(&statement).await {
                Ok(proof) if PB::verify(&statement, &proof) => Some(proof),
                Ok(_) => {
                    log::warn!(target: "consensus_core::bundle", "proof failed verification against its own statement");
                    None
                }
                Err(e) => {
                    log::debug!(target: "consensus_core::bundle", "proving failed: {e}");
                    None
                }
            }
        });
        let cancelled_fut = Box::pin(task_cancel.cancelled());

        match future::select(prove_fut, cancelled_fut).await {
            // `select` polls its left future first and returns immediately if
            // it is already `Ready`, so a `cancel()` racing in between this
            // poll and the caller's call never gets a chance to be observed
            // by the right branch. Re-checking the flag here closes that
            // window: a cancellation requested before this point always wins.
            Either::Left((result, _)) if !task_cancel.is_cancelled() => result,
            _ => {
                log::debug!(target: "consensus_core::bundle", "bundle build cancelled");
                None
            }
        }
    });

    BundleHandle { target_hash, cancel, task }
}

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

//! Mining coordinator (spec.md section 4.3): per current tip, runs exactly
//! one bundle builder and one hashing worker, emits a `TransitionWithWitness`
//! on first joint success, and restarts from scratch on every `TipChange`.

use std::sync::Arc;

use futures::future::{self, Either};

use crate::bundle;
use crate::cancel::CancelToken;
use crate::collaborators::{Ledger, ProvingBackend, TransactionPool};
use crate::encoding::Encodable;
use crate::error::{ConsensusError, Result};
use crate::hashing::{self, HashingOutcome};
use crate::model::consensus_state::CommonFields;
use crate::model::tip::{Tip, TipChange};
use crate::model::transition::{Transition, TransitionWithWitness};

/// Bounded capacity of the emission stream (spec.md section 4.3).
const EMISSION_CAPACITY: usize = 64;

/// Default "transactions per bundle" (spec.md section 4.3).
pub const DEFAULT_TRANSACTIONS_PER_BUNDLE: usize = 10;

pub struct CoordinatorHandle {
    output: async_channel::Receiver<TransitionWithWitness>,
    stop: CancelToken,
    task: smol::Task<Result<()>>,
}

impl CoordinatorHandle {
    /// A clone of the output stream; emissions arrive in completion order.
    pub fn output(&self) -> async_channel::Receiver<TransitionWithWitness> {
        self.output.clone()
    }

    /// Requests the coordinator stop after its current wait point; cancels
    /// any in-flight attempt.
    pub fn stop(&self) {
        self.stop.cancel()
    }

    /// Resolves once the coordinator task exits: `Ok(())` on a clean stop
    /// or an exhausted tip-change stream, `Err` on a fatal condition
    /// (spec.md section 7's Fatal tier).
    pub async fn join(self) -> Result<()> {
        self.task.await
    }
}

async fn next_tip<C, L, P>(
    tip_changes: &async_channel::Receiver<TipChange<C, L, P>>,
    stop: &CancelToken,
) -> Option<Tip<C, L, P>>
where
    L: Ledger,
    P: TransactionPool,
{
    match future::select(Box::pin(tip_changes.recv()), Box::pin(stop.cancelled())).await {
        Either::Left((Ok(TipChange(tip)), _)) => Some(tip),
        Either::Left((Err(_), _)) => None,
        Either::Right(_) => None,
    }
}

/// Runs the coordinator as a background task (spec.md section 4.3).
/// `transactions_per_bundle` is spec.md's "transactions per bundle, k".
pub fn run<C, L, P, PB>(
    tip_changes: async_channel::Receiver<TipChange<C, L, P>>,
    proving: Arc<PB>,
    transactions_per_bundle: usize,
) -> CoordinatorHandle
where
    C: Encodable + CommonFields + Clone + Send + Sync + 'static,
    L: Ledger,
    P: TransactionPool,
    PB: ProvingBackend,
{
    let (output_tx, output_rx) = async_channel::bounded(EMISSION_CAPACITY);
    let stop = CancelToken::new();
    let task_stop = stop.clone();

    let task = smol::spawn(async move {
        let Some(mut tip) = next_tip(&tip_changes, &task_stop).await else {
            return if task_stop.is_cancelled() { Ok(()) } else { Err(ConsensusError::TipStreamEnded) };
        };

        loop {
            let txs = tip.transaction_pool.get(transactions_per_bundle);
            let bundle_handle = bundle::build(&tip.ledger, txs.clone(), proving.clone());
            let hashing_handle = hashing::create(&tip.state.consensus_state, bundle_handle.target_hash());
            let bundle_cancel = bundle_handle.cancel_token();
            let hashing_cancel = hashing_handle.cancel_token();

            let joint = Box::pin(async { futures::join!(bundle_handle.result(), hashing_handle.result()) });
            let interrupt = Box::pin(async { next_tip(&tip_changes, &task_stop).await });

            match future::select(joint, interrupt).await {
                Either::Left(((bundle_result, hashing_outcome), _)) => {
                    match (bundle_result, hashing_outcome) {
                        (Some(proof), HashingOutcome::Found { candidate, nonce }) => {
                            let witness = TransitionWithWitness {
                                transition: Transition {
                                    ledger_hash: candidate.ledger_hash,
                                    ledger_proof: proof,
                                    timestamp: candidate.timestamp,
                                    nonce,
                                },
                                transactions: txs,
                            };
                            match output_tx.try_send(witness) {
                                Ok(()) => {
                                    log::info!(target: "consensus_core::coordinator", "emitted transition for tip at {:?}", candidate.previous_state_hash);
                                }
                                Err(async_channel::TrySendError::Full(_)) => {
                                    log::error!(target: "consensus_core::coordinator", "emission channel full, consumer appears stalled");
                                    return Err(ConsensusError::EmissionChannelFull);
                                }
                                Err(async_channel::TrySendError::Closed(_)) => return Ok(()),
                            }
                        }
                        (None, _) => {
                            log::debug!(target: "consensus_core::coordinator", "bundling failed for current tip");
                        }
                        (_, HashingOutcome::Cancelled) => {
                            log::warn!(target: "consensus_core::coordinator", "hashing worker cancelled without a tip change");
                        }
                    }

                    match next_tip(&tip_changes, &task_stop).await {
                        Some(next) => tip = next,
                        None => return if task_stop.is_cancelled() { Ok(()) } else { Err(ConsensusError::TipStreamEnded) },
                    }
                }
                Either::Right((maybe_next, _)) => {
                    // A tip change (or a stop request) interrupted the attempt:
                    // cancellation must be observed before the replacement
                    // attempt starts (spec.md section 4.3, P6).
                    bundle_cancel.cancel();
                    hashing_cancel.cancel();
                    match maybe_next {
                        Some(next) => tip = next,
                        None => return if task_stop.is_cancelled() { Ok(()) } else { Err(ConsensusError::TipStreamEnded) },
                    }
                }
            }
        }
    });

    CoordinatorHandle { output: output_rx, stop, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use crate::hash::Hash;
    use crate::model::consensus_state::SignatureConsensusState;
    use crate::model::protocol_state::{BlockchainState, ProtocolState};
    use crate::testutil::{FifoTransactionPool, InMemoryLedger, TrivialProvingBackend};

    fn tip_with_difficulty(difficulty: Difficulty) -> Tip<SignatureConsensusState, InMemoryLedger, FifoTransactionPool> {
        let ledger = InMemoryLedger::genesis();
        Tip {
            state: ProtocolState {
                previous_state_hash: Hash([0u8; 32]),
                blockchain_state: BlockchainState { staged_ledger_hash: ledger.hash(), timestamp: 0 },
                consensus_state: SignatureConsensusState::genesis(ledger.hash(), 0, difficulty),
            },
            ledger,
            transaction_pool: Arc::new(FifoTransactionPool::new(vec![])),
        }
    }

    #[test]
    fn emits_a_transition_once_the_first_tip_resolves() {
        smol::block_on(async {
            let (tx, rx) = async_channel::bounded(1);
            tx.send(TipChange(tip_with_difficulty(Difficulty::MAX))).await.unwrap();

            let handle = run(rx, Arc::new(TrivialProvingBackend), DEFAULT_TRANSACTIONS_PER_BUNDLE);
            let output = handle.output();
            let witness = output.recv().await.expect("expected one emission");
            assert_eq!(witness.transactions.len(), 0);

            handle.stop();
            tx.close();
            let _ = handle.join().await;
        });
    }

    #[test]
    fn unsolvable_difficulty_emits_nothing_until_stopped() {
        smol::block_on(async {
            let (tx, rx) = async_channel::bounded(1);
            tx.send(TipChange(tip_with_difficulty(Difficulty::NONE))).await.unwrap();

            let handle = run(rx, Arc::new(TrivialProvingBackend), DEFAULT_TRANSACTIONS_PER_BUNDLE);
            smol::Timer::after(std::time::Duration::from_millis(30)).await;
            handle.stop();
            assert_eq!(handle.join().await, Ok(()));
        });
    }

    #[test]
    fn second_tip_change_cancels_the_first_unsolvable_attempt() {
        smol::block_on(async {
            let (tx, rx) = async_channel::bounded(2);
            tx.send(TipChange(tip_with_difficulty(Difficulty::NONE))).await.unwrap();

            let handle = run(rx, Arc::new(TrivialProvingBackend), DEFAULT_TRANSACTIONS_PER_BUNDLE);
            smol::Timer::after(std::time::Duration::from_millis(30)).await;
            tx.send(TipChange(tip_with_difficulty(Difficulty::MAX))).await.unwrap();

            let output = handle.output();
            let witness = output.recv().await.expect("second tip should resolve");
            assert_eq!(witness.transactions.len(), 0);

            handle.stop();
            tx.close();
            let _ = handle.join().await;
        });
    }
}

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

use std::io::{self, Write};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::difficulty::Difficulty;
use crate::encoding::{serialize, Encodable};
use crate::hash::Hash;
use crate::model::consensus_state::CommonFields;
use crate::nonce::Nonce;
use crate::strength::Strength;

/// Candidate header fields the hashing worker searches a nonce against
/// (spec.md section 4.2). Identical in shape to the common fields every
/// `ConsensusState` variant carries; variant-specific extension fields are
/// layered on top by `ConsensusMechanism::next_state_checked`, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderCandidate {
    pub previous_state_hash: Hash,
    pub ledger_hash: Hash,
    pub timestamp: i64,
    pub next_difficulty: Difficulty,
    pub strength: Strength,
}

impl Encodable for HeaderCandidate {
    fn encode(&self, writer: &mut dyn Write) -> io::Result<usize> {
        let mut n = 0;
        n += self.next_difficulty.0.encode(writer)?;
        n += self.previous_state_hash.0.encode(writer)?;
        n += self.ledger_hash.0.encode(writer)?;
        n += self.strength.0.encode(writer)?;
        n += self.timestamp.encode(writer)?;
        Ok(n)
    }
}

fn header_digest(candidate: &HeaderCandidate, nonce: Nonce) -> Hash {
    let mut bytes = serialize(candidate);
    bytes.extend_from_slice(&nonce.to_le_bytes());
    Hash::digest(&bytes)
}

/// Number of candidate nonces tried before yielding cooperatively (spec.md
/// section 4.2, "fixed-size batches... order ~= 10 per batch").
const NONCES_PER_BATCH: u32 = 10;

/// How long the worker yields between batches so cancellation is observed
/// promptly (spec.md section 4.2, "pause ~= 10 ms").
const BATCH_YIELD: Duration = Duration::from_millis(10);

/// Terminal outcome of a hashing search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashingOutcome {
    Found { candidate: HeaderCandidate, nonce: Nonce },
    Cancelled,
}

/// A handle to an in-flight nonce search (spec.md section 4.2).
pub struct HashingHandle {
    cancel: CancelToken,
    task: smol::Task<HashingOutcome>,
}

impl HashingHandle {
    pub async fn result(self) -> HashingOutcome {
        self.task.await
    }

    /// A clone of the handle's cancellation token, so a caller can keep the
    /// ability to cancel after moving the handle itself into a `result()` await.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Idempotent; causes `result()` to resolve to `Cancelled` if not yet
    /// resolved.
    pub fn cancel(&self) {
        self.cancel.cancel()
    }
}

/// Searches for `(new_state, nonce)` meeting `previous_state`'s current
/// difficulty target (spec.md section 4.2). The search consumes bounded
/// memory: only the current batch's nonce is ever held, nothing tried is
/// remembered.
pub fn create<C: Encodable + CommonFields>(previous_state: &C, next_ledger_hash: Hash) -> HashingHandle {
    let previous_state_hash = Hash::digest(&serialize(previous_state));
    let target_difficulty = previous_state.next_difficulty();
    let prev_timestamp = previous_state.timestamp();
    let prev_strength = previous_state.strength();

    let cancel = CancelToken::new();
    let task_cancel = cancel.clone();

    let task = smol::spawn(async move {
        loop {
            if task_cancel.is_cancelled() {
                log::debug!(target: "consensus_core::hashing", "hashing cancelled before batch start");
                return HashingOutcome::Cancelled;
            }

            let timestamp = now_ms();
            let candidate = HeaderCandidate {
                previous_state_hash,
                ledger_hash: next_ledger_hash,
                timestamp,
                next_difficulty: Difficulty::next(target_difficulty, prev_timestamp, timestamp),
                strength: Strength::increase(prev_strength, target_difficulty),
            };

            let mut nonce = Nonce::random();
            for _ in 0..NONCES_PER_BATCH {
                if target_difficulty.meets(&header_digest(&candidate, nonce)) {
                    return HashingOutcome::Found { candidate, nonce };
                }
                nonce = nonce.next();
            }

            futures::future::select(
                Box::pin(smol::Timer::after(BATCH_YIELD)),
                Box::pin(task_cancel.cancelled()),
            )
            .await;
        }
    });

    HashingHandle { cancel, task }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::consensus_state::SignatureConsensusState;

    fn genesis_state(difficulty: Difficulty) -> SignatureConsensusState {
        SignatureConsensusState::genesis(Hash::digest(b"genesis-ledger"), now_ms(), difficulty)
    }

    #[test]
    fn max_difficulty_resolves_within_one_batch() {
        smol::block_on(async {
            let prev = genesis_state(Difficulty::MAX);
            let handle = create(&prev, Hash::digest(b"target"));
            assert!(matches!(handle.result().await, HashingOutcome::Found { .. }));
        });
    }

    #[test]
    fn unsolvable_difficulty_cancels_within_one_batch_duration() {
        smol::block_on(async {
            let prev = genesis_state(Difficulty::NONE);
            let handle = create(&prev, Hash::digest(b"target"));
            smol::Timer::after(Duration::from_millis(5)).await;
            handle.cancel();
            assert_eq!(handle.result().await, HashingOutcome::Cancelled);
        });
    }

    #[test]
    fn found_candidate_meets_previous_difficulty() {
        smol::block_on(async {
            let prev = genesis_state(Difficulty::MAX);
            let handle = create(&prev, Hash::digest(b"target"));
            let HashingOutcome::Found { candidate, nonce } = handle.result().await else {
                panic!("expected a solution");
            };
            assert!(prev.next_difficulty().meets(&header_digest(&candidate, nonce)));
        });
    }
}

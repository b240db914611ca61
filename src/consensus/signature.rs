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

//! Signature-variant consensus mechanism (spec.md section 4.4.1): proposer
//! eligibility is fixed to the holder of a single designated signing key,
//! gated by a minimum proposal interval. No VRF, no stake, no epochs.

use std::marker::PhantomData;

use crate::collaborators::{PublicKey, SignatureScheme, Transaction};
use crate::encoding::serialize;
use crate::error::{ConsensusError, Result};
use crate::hash::Hash;
use crate::model::consensus_state::SignatureConsensusState;
use crate::model::protocol_state::{BlockchainState, ProtocolState};
use crate::model::snark_transition::{ConsensusTransitionData, SnarkTransition};

use super::{ConsensusMechanism, Selection};

/// `S` is the `SignatureScheme` implementation this deployment signs with;
/// fixed at the type level so `verify` never has to guess a scheme.
pub struct SignatureConsensus<S> {
    pub designated_signer: PublicKey,
    pub proposal_interval_ms: i64,
    pub genesis_ledger_hash: Hash,
    pub genesis_timestamp: i64,
    pub initial_difficulty: crate::difficulty::Difficulty,
    _scheme: PhantomData<S>,
}

impl<S> SignatureConsensus<S> {
    pub fn new(
        designated_signer: PublicKey,
        proposal_interval_ms: i64,
        genesis_ledger_hash: Hash,
        genesis_timestamp: i64,
        initial_difficulty: crate::difficulty::Difficulty,
    ) -> Self {
        Self {
            designated_signer,
            proposal_interval_ms,
            genesis_ledger_hash,
            genesis_timestamp,
            initial_difficulty,
            _scheme: PhantomData,
        }
    }
}

impl<S: SignatureScheme> ConsensusMechanism for SignatureConsensus<S> {
    type ConsensusState = SignatureConsensusState;
    type LocalState = ();
    type Signer = S;

    fn genesis_protocol_state(&self) -> ProtocolState<SignatureConsensusState> {
        ProtocolState {
            previous_state_hash: Hash([0u8; 32]),
            blockchain_state: BlockchainState {
                staged_ledger_hash: self.genesis_ledger_hash,
                timestamp: self.genesis_timestamp,
            },
            consensus_state: SignatureConsensusState::genesis(
                self.genesis_ledger_hash,
                self.genesis_timestamp,
                self.initial_difficulty,
            ),
        }
    }

    fn generate_transition(
        &self,
        prev_state: &ProtocolState<SignatureConsensusState>,
        mut blockchain_state: BlockchainState,
        _local_state: &(),
        time: i64,
        signer: &S,
        _transactions: &[Transaction],
    ) -> Option<(ProtocolState<SignatureConsensusState>, ConsensusTransitionData)> {
        if signer.public_key() != self.designated_signer {
            return None;
        }
        if time - prev_state.consensus_state.timestamp < self.proposal_interval_ms {
            return None;
        }

        blockchain_state.timestamp = time;
        let signature = signer.sign(&serialize(&blockchain_state));
        let transition_data = ConsensusTransitionData::Signature(signature);

        let snark_transition = SnarkTransition {
            blockchain_state,
            consensus_transition_data: transition_data.clone(),
            proof: crate::collaborators::LedgerProof(Vec::new()),
        };
        let prev_state_hash = Hash::digest(&serialize(&prev_state.consensus_state));
        let new_consensus_state =
            self.next_state_checked(&prev_state.consensus_state, prev_state_hash, &snark_transition).ok()?;

        let new_protocol_state = ProtocolState {
            previous_state_hash: prev_state.hash(),
            blockchain_state: snark_transition.blockchain_state,
            consensus_state: new_consensus_state,
        };
        Some((new_protocol_state, transition_data))
    }

    fn is_transition_valid_checked(&self, transition: &SnarkTransition) -> bool {
        match &transition.consensus_transition_data {
            ConsensusTransitionData::Signature(sig) => {
                S::verify(&self.designated_signer, &serialize(&transition.blockchain_state), sig)
            }
            ConsensusTransitionData::Stake { .. } => false,
        }
    }

    fn next_state_checked(
        &self,
        prev_state: &SignatureConsensusState,
        prev_state_hash: Hash,
        transition: &SnarkTransition,
    ) -> Result<SignatureConsensusState> {
        if !self.is_transition_valid_checked(transition) {
            return Err(ConsensusError::InvalidTransition("bad proposer signature".into()));
        }
        if transition.blockchain_state.timestamp <= prev_state.timestamp {
            return Err(ConsensusError::InvalidTransition("timestamp did not advance".into()));
        }

        let next_difficulty = crate::difficulty::Difficulty::next(
            prev_state.next_difficulty,
            prev_state.timestamp,
            transition.blockchain_state.timestamp,
        );
        let strength = crate::strength::Strength::increase(prev_state.strength, prev_state.next_difficulty);

        Ok(SignatureConsensusState {
            next_difficulty,
            previous_state_hash: prev_state_hash,
            ledger_hash: transition.blockchain_state.staged_ledger_hash,
            strength,
            timestamp: transition.blockchain_state.timestamp,
        })
    }

    fn next_state(
        &self,
        prev_state: &SignatureConsensusState,
        prev_state_hash: Hash,
        transition: &SnarkTransition,
    ) -> Result<SignatureConsensusState> {
        // Out-of-circuit duplicate of next_state_checked's formula, written
        // independently so the agreement property below is not vacuous.
        if !self.is_transition_valid_checked(transition) {
            return Err(ConsensusError::InvalidTransition("bad proposer signature".into()));
        }
        if transition.blockchain_state.timestamp <= prev_state.timestamp {
            return Err(ConsensusError::InvalidTransition("timestamp did not advance".into()));
        }

        let elapsed = (transition.blockchain_state.timestamp - prev_state.timestamp).max(1);
        let scaled = prev_state.next_difficulty.0.saturating_mul(elapsed as u128) / 15_000;
        let lower = prev_state.next_difficulty.0 / 2;
        let upper = prev_state.next_difficulty.0.saturating_mul(2).max(1);
        let next_difficulty = crate::difficulty::Difficulty(scaled.clamp(lower, upper));

        let work = u128::MAX / prev_state.next_difficulty.0.saturating_add(1);
        let strength = crate::strength::Strength(prev_state.strength.0.saturating_add(work));

        Ok(SignatureConsensusState {
            next_difficulty,
            previous_state_hash: prev_state_hash,
            ledger_hash: transition.blockchain_state.staged_ledger_hash,
            strength,
            timestamp: transition.blockchain_state.timestamp,
        })
    }

    fn select(
        &self,
        a: &SignatureConsensusState,
        a_time_received: i64,
        b: &SignatureConsensusState,
        b_time_received: i64,
    ) -> Selection {
        if a.strength > b.strength {
            Selection::Keep
        } else if b.strength > a.strength {
            Selection::Take
        } else if a_time_received <= b_time_received {
            Selection::Keep
        } else {
            Selection::Take
        }
    }

    fn lock_transition(
        &self,
        _old: &SignatureConsensusState,
        _new: &SignatureConsensusState,
        _snarked_ledger_hash: Hash,
        _local_state: &mut (),
    ) {
        // Nothing to track locally: the signature variant has no epoch
        // seed or frozen stake distribution to roll forward.
    }
}

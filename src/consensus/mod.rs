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

pub mod signature;
pub mod stake;

use crate::collaborators::Transaction;
use crate::error::Result;
use crate::hash::Hash;
use crate::model::consensus_state::CommonFields;
use crate::model::protocol_state::{BlockchainState, ProtocolState};
use crate::model::snark_transition::{ConsensusTransitionData, SnarkTransition};

/// Fork-choice outcome (spec.md section 4.4, "select(a, b, time_received)
/// -> Keep | Take").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Keep,
    Take,
}

/// The common contract every consensus mechanism variant implements
/// (spec.md section 4.4).
pub trait ConsensusMechanism {
    type ConsensusState: Clone + CommonFields;
    /// Proposer-local mutable state the mechanism updates on
    /// `lock_transition` (e.g. the stake variant's cached epoch seed).
    type LocalState;
    /// Whatever identifies the calling proposer to `generate_transition`
    /// (a keypair for the signature variant, a staking key for the stake
    /// variant).
    type Signer;

    fn genesis_protocol_state(&self) -> ProtocolState<Self::ConsensusState>;

    /// Called by the proposer; `None` when not eligible to produce a block
    /// at `time` under this variant's rule.
    #[allow(clippy::too_many_arguments)]
    fn generate_transition(
        &self,
        prev_state: &ProtocolState<Self::ConsensusState>,
        blockchain_state: BlockchainState,
        local_state: &Self::LocalState,
        time: i64,
        signer: &Self::Signer,
        transactions: &[Transaction],
    ) -> Option<(ProtocolState<Self::ConsensusState>, ConsensusTransitionData)>;

    /// In-circuit validity check of the variant's additional evidence.
    fn is_transition_valid_checked(&self, transition: &SnarkTransition) -> bool;

    /// In-circuit transition function.
    fn next_state_checked(
        &self,
        prev_state: &Self::ConsensusState,
        prev_state_hash: Hash,
        transition: &SnarkTransition,
    ) -> Result<Self::ConsensusState>;

    /// Out-of-circuit duplicate of `next_state_checked`; the two must
    /// agree on all inputs (spec.md section 9, design note on in-circuit
    /// vs out-of-circuit duplication).
    fn next_state(
        &self,
        prev_state: &Self::ConsensusState,
        prev_state_hash: Hash,
        transition: &SnarkTransition,
    ) -> Result<Self::ConsensusState> {
        self.next_state_checked(prev_state, prev_state_hash, transition)
    }

    /// Fork-choice between two candidate tips. Must be total, deterministic
    /// and reflexive: `select(a, a_t, a, a_t) == Keep`.
    fn select(
        &self,
        a: &Self::ConsensusState,
        a_time_received: i64,
        b: &Self::ConsensusState,
        b_time_received: i64,
    ) -> Selection;

    /// Side-effecting hook invoked when a locked-in tip advances.
    fn lock_transition(
        &self,
        old: &Self::ConsensusState,
        new: &Self::ConsensusState,
        snarked_ledger_hash: Hash,
        local_state: &mut Self::LocalState,
    );
}

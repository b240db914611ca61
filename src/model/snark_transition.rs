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

use crate::collaborators::{LedgerProof, PublicKey, Signature};
use crate::hash::Hash;
use crate::model::consensus_state::VrfOutput;
use crate::model::protocol_state::BlockchainState;

/// Variant-specific evidence carried by a `SnarkTransition` (spec.md
/// section 3: "a proposer signature, or slot/VRF output"). The stake
/// variant also carries the epoch seed the VRF output was drawn against,
/// since `is_transition_valid_checked` otherwise has no way to recompute
/// what the proposer was supposed to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusTransitionData {
    Signature(Signature),
    Stake { slot: u64, vrf_output: VrfOutput, proposer_pubkey: PublicKey, epoch_seed: Hash },
}

/// `{ blockchain_state, consensus_transition_data, proof }` (spec.md
/// section 3, "SnarkTransition").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnarkTransition {
    pub blockchain_state: BlockchainState,
    pub consensus_transition_data: ConsensusTransitionData,
    pub proof: LedgerProof,
}

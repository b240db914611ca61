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

pub mod consensus_state;
pub mod protocol_state;
pub mod snark_transition;
pub mod tip;
pub mod transition;

pub use consensus_state::{SignatureConsensusState, StakeConsensusState, VrfOutput};
pub use protocol_state::{BlockchainState, ProtocolState};
pub use snark_transition::{ConsensusTransitionData, SnarkTransition};
pub use tip::{Tip, TipChange};
pub use transition::{Transition, TransitionWithWitness};

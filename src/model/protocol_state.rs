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

use std::io::{self, Read, Write};

use crate::encoding::{serialize, Decodable, Encodable};
use crate::hash::Hash;

/// The non-consensus header payload the transition function needs
/// (spec.md section 3, "BlockchainState"; scoped down to the single field
/// the consensus transition actually reads, per that section's note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockchainState {
    pub staged_ledger_hash: Hash,
    /// When this block was formed. Carried on `BlockchainState` rather than
    /// invented as an extra parameter threaded through the consensus
    /// mechanism's trait methods, since spec.md's `ConsensusTransitionData`
    /// variants don't otherwise carry a timestamp.
    pub timestamp: i64,
}

impl Encodable for BlockchainState {
    fn encode(&self, writer: &mut dyn Write) -> io::Result<usize> {
        let mut n = 0;
        n += self.staged_ledger_hash.0.encode(writer)?;
        n += self.timestamp.encode(writer)?;
        Ok(n)
    }
}

impl Decodable for BlockchainState {
    fn decode(reader: &mut dyn Read) -> io::Result<Self> {
        Ok(Self {
            staged_ledger_hash: Hash(<[u8; 32]>::decode(reader)?),
            timestamp: i64::decode(reader)?,
        })
    }
}

/// `{ previous_state_hash, blockchain_state, consensus_state }`
/// (spec.md section 3, "ProtocolState"). Its hash is the parent link every
/// descendant's `previous_state_hash` must equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolState<C> {
    pub previous_state_hash: Hash,
    pub blockchain_state: BlockchainState,
    pub consensus_state: C,
}

impl<C: Encodable> ProtocolState<C> {
    pub fn hash(&self) -> Hash {
        Hash::digest(&serialize(self))
    }
}

impl<C: Encodable> Encodable for ProtocolState<C> {
    fn encode(&self, writer: &mut dyn Write) -> io::Result<usize> {
        let mut n = 0;
        n += self.previous_state_hash.0.encode(writer)?;
        n += self.blockchain_state.encode(writer)?;
        n += self.consensus_state.encode(writer)?;
        Ok(n)
    }
}

impl<C: Decodable> Decodable for ProtocolState<C> {
    fn decode(reader: &mut dyn Read) -> io::Result<Self> {
        Ok(Self {
            previous_state_hash: Hash(<[u8; 32]>::decode(reader)?),
            blockchain_state: BlockchainState::decode(reader)?,
            consensus_state: C::decode(reader)?,
        })
    }
}

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

use crate::difficulty::Difficulty;
use crate::encoding::{bits_of_bytes, pad_to_triples, BitEncode, Decodable, Encodable};
use crate::hash::Hash;
use crate::strength::Strength;

/// Signature-variant consensus state (spec.md section 3, "Signature variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureConsensusState {
    pub next_difficulty: Difficulty,
    pub previous_state_hash: Hash,
    pub ledger_hash: Hash,
    pub strength: Strength,
    pub timestamp: i64,
}

impl SignatureConsensusState {
    pub fn genesis(genesis_ledger_hash: Hash, genesis_timestamp: i64, initial_difficulty: Difficulty) -> Self {
        Self {
            next_difficulty: initial_difficulty,
            previous_state_hash: Hash([0u8; 32]),
            ledger_hash: genesis_ledger_hash,
            strength: Strength::ZERO,
            timestamp: genesis_timestamp,
        }
    }
}

impl Encodable for SignatureConsensusState {
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

impl Decodable for SignatureConsensusState {
    fn decode(reader: &mut dyn Read) -> io::Result<Self> {
        Ok(Self {
            next_difficulty: Difficulty(u128::decode(reader)?),
            previous_state_hash: Hash(<[u8; 32]>::decode(reader)?),
            ledger_hash: Hash(<[u8; 32]>::decode(reader)?),
            strength: Strength(u128::decode(reader)?),
            timestamp: i64::decode(reader)?,
        })
    }
}

impl BitEncode for SignatureConsensusState {
    // 128 (difficulty) + 256 (prev hash) + 256 (ledger hash) + 128 (strength)
    // + 64 (timestamp) = 832 bits, padded to 834 to land on a triple boundary.
    const LENGTH_IN_TRIPLES: usize = 278;

    fn to_bool_vec(&self) -> Vec<bool> {
        let mut bits = Vec::new();
        bits.extend(bits_of_bytes(&self.next_difficulty.0.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.previous_state_hash.0));
        bits.extend(bits_of_bytes(&self.ledger_hash.0));
        bits.extend(bits_of_bytes(&self.strength.0.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.timestamp.to_be_bytes()));
        pad_to_triples(bits)
    }
}

/// A verifiable-random-function output, opaque outside the stake variant's
/// eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VrfOutput(pub [u8; 32]);

impl VrfOutput {
    /// Interprets the output as a fraction of `u128::MAX` for the
    /// eligibility comparison against `stake / total_currency`
    /// (spec.md section 4.4.2).
    pub fn as_fraction_numerator(&self) -> u128 {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&self.0[..16]);
        u128::from_be_bytes(buf)
    }
}

/// Stake-variant consensus state (spec.md section 3, "Stake variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeConsensusState {
    pub next_difficulty: Difficulty,
    pub previous_state_hash: Hash,
    pub ledger_hash: Hash,
    pub strength: Strength,
    pub timestamp: i64,
    pub epoch: u64,
    pub slot: u64,
    /// Number of transitions since genesis; the same-epoch fork-choice
    /// ladder's primary tie-break dimension (spec.md section 4.4.2, "prefer
    /// longer chain").
    pub length: u64,
    pub total_currency: u64,
    pub vrf_output: VrfOutput,
}

impl StakeConsensusState {
    pub fn genesis(
        genesis_ledger_hash: Hash,
        genesis_timestamp: i64,
        initial_difficulty: Difficulty,
        total_currency: u64,
    ) -> Self {
        Self {
            next_difficulty: initial_difficulty,
            previous_state_hash: Hash([0u8; 32]),
            ledger_hash: genesis_ledger_hash,
            strength: Strength::ZERO,
            timestamp: genesis_timestamp,
            epoch: 0,
            slot: 0,
            length: 0,
            total_currency,
            vrf_output: VrfOutput([0u8; 32]),
        }
    }
}

impl Encodable for StakeConsensusState {
    fn encode(&self, writer: &mut dyn Write) -> io::Result<usize> {
        let mut n = 0;
        n += self.next_difficulty.0.encode(writer)?;
        n += self.previous_state_hash.0.encode(writer)?;
        n += self.ledger_hash.0.encode(writer)?;
        n += self.strength.0.encode(writer)?;
        n += self.timestamp.encode(writer)?;
        n += self.epoch.encode(writer)?;
        n += self.slot.encode(writer)?;
        n += self.length.encode(writer)?;
        n += self.total_currency.encode(writer)?;
        n += self.vrf_output.0.encode(writer)?;
        Ok(n)
    }
}

impl Decodable for StakeConsensusState {
    fn decode(reader: &mut dyn Read) -> io::Result<Self> {
        Ok(Self {
            next_difficulty: Difficulty(u128::decode(reader)?),
            previous_state_hash: Hash(<[u8; 32]>::decode(reader)?),
            ledger_hash: Hash(<[u8; 32]>::decode(reader)?),
            strength: Strength(u128::decode(reader)?),
            timestamp: i64::decode(reader)?,
            epoch: u64::decode(reader)?,
            slot: u64::decode(reader)?,
            length: u64::decode(reader)?,
            total_currency: u64::decode(reader)?,
            vrf_output: VrfOutput(<[u8; 32]>::decode(reader)?),
        })
    }
}

impl BitEncode for StakeConsensusState {
    // Signature-variant's 832 bits + 64 (epoch) + 64 (slot) + 64 (length)
    // + 64 (total_currency) + 256 (vrf_output) = 1344 bits, already a
    // multiple of 3.
    const LENGTH_IN_TRIPLES: usize = 448;

    fn to_bool_vec(&self) -> Vec<bool> {
        let mut bits = Vec::new();
        bits.extend(bits_of_bytes(&self.next_difficulty.0.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.previous_state_hash.0));
        bits.extend(bits_of_bytes(&self.ledger_hash.0));
        bits.extend(bits_of_bytes(&self.strength.0.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.timestamp.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.epoch.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.slot.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.length.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.total_currency.to_be_bytes()));
        bits.extend(bits_of_bytes(&self.vrf_output.0));
        pad_to_triples(bits)
    }
}

/// The fields every `ConsensusState` variant shares, independent of the
/// variant-specific extension data (spec.md section 4.2's hashing worker
/// only ever reads/writes these).
pub trait CommonFields {
    fn next_difficulty(&self) -> Difficulty;
    fn timestamp(&self) -> i64;
    fn strength(&self) -> Strength;
}

impl CommonFields for SignatureConsensusState {
    fn next_difficulty(&self) -> Difficulty {
        self.next_difficulty
    }
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
    fn strength(&self) -> Strength {
        self.strength
    }
}

impl CommonFields for StakeConsensusState {
    fn next_difficulty(&self) -> Difficulty {
        self.next_difficulty
    }
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
    fn strength(&self) -> Strength {
        self.strength
    }
}

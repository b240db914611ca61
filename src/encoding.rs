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

//! Binary and canonical bit encodings for the consensus-state family
//! (spec.md section 3: "a binary and a canonical bit-encoding").
//!
//! `Encodable`/`Decodable` mirror the shape of the teacher's
//! `darkfi_serial::Encodable` trait observed in `bin/darkfid/src/task/miner.rs`
//! (`debris.params.encode(&mut data)?`), reimplemented locally since the
//! `darkfi-serial` crate's source was not part of the retrieved sources.

use std::io::{self, Read, Write};

pub trait Encodable {
    fn encode(&self, writer: &mut dyn Write) -> io::Result<usize>;
}

pub trait Decodable: Sized {
    fn decode(reader: &mut dyn Read) -> io::Result<Self>;
}

pub fn serialize<T: Encodable>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.encode(&mut buf).expect("encoding into a Vec<u8> never fails");
    buf
}

pub fn deserialize<T: Decodable>(bytes: &[u8]) -> io::Result<T> {
    let mut cursor = io::Cursor::new(bytes);
    T::decode(&mut cursor)
}

macro_rules! impl_int_codec {
    ($ty:ty) => {
        impl Encodable for $ty {
            fn encode(&self, writer: &mut dyn Write) -> io::Result<usize> {
                let bytes = self.to_le_bytes();
                writer.write_all(&bytes)?;
                Ok(bytes.len())
            }
        }

        impl Decodable for $ty {
            fn decode(reader: &mut dyn Read) -> io::Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                reader.read_exact(&mut bytes)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }
        }
    };
}

impl_int_codec!(u64);
impl_int_codec!(u128);
impl_int_codec!(i64);

impl Encodable for [u8; 32] {
    fn encode(&self, writer: &mut dyn Write) -> io::Result<usize> {
        writer.write_all(self)?;
        Ok(32)
    }
}

impl Decodable for [u8; 32] {
    fn decode(reader: &mut dyn Read) -> io::Result<Self> {
        let mut bytes = [0u8; 32];
        reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

/// Expands bytes into booleans, most-significant-bit first.
pub fn bits_of_bytes(bytes: &[u8]) -> Vec<bool> {
    let mut out = Vec::with_capacity(bytes.len() * 8);
    for byte in bytes {
        for i in (0..8).rev() {
            out.push((byte >> i) & 1 == 1);
        }
    }
    out
}

/// Pads a bit vector with `false` until its length is a multiple of 3, so
/// it can be grouped into whole triples.
pub fn pad_to_triples(mut bits: Vec<bool>) -> Vec<bool> {
    while !bits.len().is_multiple_of(3) {
        bits.push(false);
    }
    bits
}

/// The canonical bit-encoding contract every `ConsensusState` variant
/// implements (spec.md: "a fixed `length_in_triples`", "a `length`
/// accessor", R2's `fold` property).
pub trait BitEncode {
    /// Number of boolean triples in the canonical encoding. Fixed per type.
    const LENGTH_IN_TRIPLES: usize;

    /// Total number of booleans: `LENGTH_IN_TRIPLES * 3`.
    fn length(&self) -> usize {
        Self::LENGTH_IN_TRIPLES * 3
    }

    /// The canonical bit encoding; must have exactly `length()` entries.
    fn to_bool_vec(&self) -> Vec<bool>;

    /// Folds over the canonical bit encoding left to right.
    fn fold<A>(&self, init: A, f: impl FnMut(A, bool) -> A) -> A {
        self.to_bool_vec().into_iter().fold(init, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_round_trips() {
        let value: u64 = 0xDEAD_BEEF_0000_1234;
        let bytes = serialize(&value);
        let decoded: u64 = deserialize(&bytes).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn hash_bytes_round_trip() {
        let value: [u8; 32] = [7u8; 32];
        let bytes = serialize(&value);
        let decoded: [u8; 32] = deserialize(&bytes).unwrap();
        assert_eq!(value, decoded);
    }
}

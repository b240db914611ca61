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

//! Consensus-driven block production core (see `SPEC_FULL.md`): a bundle
//! builder, a hashing worker, a mining coordinator, and the signature/stake
//! consensus mechanisms that plug into it.

pub mod bundle;
pub mod cancel;
pub mod collaborators;
pub mod config;
pub mod consensus;
pub mod coordinator;
pub mod difficulty;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod hashing;
pub mod model;
pub mod nonce;
pub mod strength;

#[cfg(test)]
pub mod testutil;

pub use error::{ConsensusError, Result};

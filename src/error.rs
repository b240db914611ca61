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

use thiserror::Error;

/// Errors produced by the consensus core.
///
/// Every variant names the component that raised it, per the taxonomy in
/// spec.md section 7 (Transient / Input-invalid / Protocol-invariant / Fatal).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Transient: the bundle builder resolved to `None`.
    #[error("bundling failed")]
    BundlingFailed,

    /// Transient: a worker was cancelled before completion.
    #[error("mining cancelled")]
    MiningCancelled,

    /// Input-invalid: an environment variable held an unrecognized value.
    #[error("invalid configuration for {0}")]
    InvalidConfig(String),

    /// Protocol-invariant: a transition or tip failed validation.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Fatal: the bounded emission channel would have overflowed.
    #[error("emission channel is full, consumer appears stalled")]
    EmissionChannelFull,

    /// Fatal: the tip-change stream ended before the coordinator was stopped.
    #[error("tip-change stream ended unexpectedly")]
    TipStreamEnded,

    /// Transient: the proving backend returned an error.
    #[error("proving failed: {0}")]
    ProvingFailed(String),

    /// Transient: the ledger rejected a transaction during `apply`.
    #[error("ledger apply failed: {0}")]
    LedgerApply(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

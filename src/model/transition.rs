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

use crate::collaborators::{LedgerProof, Transaction};
use crate::hash::Hash;
use crate::nonce::Nonce;

/// The winning-nonce witness produced by the hashing worker, paired with
/// the ledger transition it commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub ledger_hash: Hash,
    pub ledger_proof: LedgerProof,
    pub timestamp: i64,
    pub nonce: Nonce,
}

/// `{ transition, transactions }` (spec.md section 3,
/// "TransitionWithWitness"): what the mining coordinator emits once both
/// the bundle and the hashing search complete for the same tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionWithWitness {
    pub transition: Transition,
    pub transactions: Vec<Transaction>,
}

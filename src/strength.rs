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

use crate::difficulty::Difficulty;

/// A monotone accumulator of work along a chain (spec.md section 3,
/// "Strength"). Associative via saturating addition so that summing
/// per-block work along any prefix of a chain gives the same total
/// regardless of grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Strength(pub u128);

impl Strength {
    pub const ZERO: Strength = Strength(0);

    /// Work implied by a difficulty target: lower target (harder) implies
    /// more work. `work(T) = u128::MAX / (T + 1)`.
    pub fn work(d: Difficulty) -> u128 {
        u128::MAX / d.0.saturating_add(1)
    }

    pub fn increase(prev: Strength, d: Difficulty) -> Strength {
        Strength(prev.0.saturating_add(Self::work(d)))
    }
}

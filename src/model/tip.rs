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

use std::sync::Arc;

use crate::collaborators::{Ledger, TransactionPool};
use crate::model::protocol_state::ProtocolState;

/// `{ state, ledger, transaction_pool }` (spec.md section 3, "Tip"): the
/// current head-of-chain the mining coordinator races against. Created by
/// the chain controller at genesis and replaced atomically on each
/// accepted transition.
#[derive(Clone)]
pub struct Tip<C, L: Ledger, P: TransactionPool> {
    pub state: ProtocolState<C>,
    pub ledger: L,
    pub transaction_pool: Arc<P>,
}

/// A tip-change event fed into the mining coordinator (spec.md section 6,
/// "Tip-change input stream").
pub struct TipChange<C, L: Ledger, P: TransactionPool>(pub Tip<C, L, P>);

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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation signal shared between a coordinator and the worker(s) it
/// owns (spec.md section 9, "Cancellation via shared mutable flag +
/// cooperative yield... prefer a cancellation primitive provided by the
/// runtime over a bare boolean").
///
/// Built on `async_channel`, the channel primitive already in the
/// dependency stack, rather than a bare `AtomicBool`: closing the channel
/// wakes every waiter immediately instead of requiring them to poll.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    signal: async_channel::Receiver<()>,
    // Kept alive so `signal` doesn't observe a close from a dropped sender
    // before `cancel()` is actually called.
    _keepalive: async_channel::Sender<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = async_channel::bounded(1);
        Self { flag: Arc::new(AtomicBool::new(false)), signal: rx, _keepalive: tx }
    }

    /// Idempotent: safe to call any number of times, before, during, or
    /// after the guarded work completes.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.signal.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called. Returns immediately if
    /// already cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        // The sender is never used to send a value; closing it is the only
        // signal. `recv` returning at all (`Ok` or `Err`) means "done".
        let _ = self.signal.recv().await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

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

//! Test doubles for the collaborator traits (spec.md section 6), used only
//! by this crate's own unit and integration tests. Mirrors the teacher's
//! practice of keeping fakes next to the traits they implement rather than
//! pulling in a mocking framework.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::collaborators::{
    Ledger, LedgerProof, PublicKey, Signature, SignatureScheme, Statement, Transaction,
    TransactionPool, VrfScheme,
};
use crate::error::{ConsensusError, Result};
use crate::hash::Hash;
use crate::model::consensus_state::VrfOutput;

/// A ledger that is just its running hash plus the transactions folded into
/// it; rejects a transaction whose `id` is `0` to exercise `apply` failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryLedger {
    hash: Hash,
}

impl InMemoryLedger {
    pub fn genesis() -> Self {
        Self { hash: Hash::digest(b"genesis-ledger") }
    }
}

impl Ledger for InMemoryLedger {
    fn hash(&self) -> Hash {
        self.hash
    }

    fn apply(&mut self, tx: &Transaction) -> Result<()> {
        if tx.id == 0 {
            return Err(ConsensusError::LedgerApply("transaction id 0 is rejected".into()));
        }
        let mut bytes = self.hash.0.to_vec();
        bytes.extend_from_slice(&tx.id.to_le_bytes());
        bytes.extend_from_slice(&tx.payload);
        self.hash = Hash::digest(&bytes);
        Ok(())
    }
}

/// Proves a `Statement` by hashing it; "verification" recomputes the same
/// hash. Stands in for a real proving backend (spec.md section 6).
pub struct TrivialProvingBackend;

/// A proving backend whose `prove` future never resolves. Used to exercise
/// cancellation deterministically: unlike `TrivialProvingBackend`, which can
/// complete before a racing `cancel()` call is even observed, this backend
/// guarantees the cancellation branch wins.
pub struct NeverProvingBackend;

#[async_trait::async_trait]
impl crate::collaborators::ProvingBackend for NeverProvingBackend {
    async fn prove(&self, _statement: &Statement) -> Result<LedgerProof> {
        std::future::pending().await
    }

    fn verify(_statement: &Statement, _proof: &LedgerProof) -> bool {
        false
    }
}

fn statement_digest(statement: &Statement) -> Hash {
    let mut bytes = statement.from_ledger_hash.0.to_vec();
    bytes.extend_from_slice(&statement.to_ledger_hash.0);
    for tx in &statement.transactions {
        bytes.extend_from_slice(&tx.id.to_le_bytes());
        bytes.extend_from_slice(&tx.payload);
    }
    Hash::digest(&bytes)
}

#[async_trait::async_trait]
impl crate::collaborators::ProvingBackend for TrivialProvingBackend {
    async fn prove(&self, statement: &Statement) -> Result<LedgerProof> {
        Ok(LedgerProof(statement_digest(statement).0.to_vec()))
    }

    fn verify(statement: &Statement, proof: &LedgerProof) -> bool {
        proof.0 == statement_digest(statement).0.to_vec()
    }
}

/// FIFO transaction pool; `get(n)` removes and returns up to `n` entries.
pub struct FifoTransactionPool {
    queue: Mutex<VecDeque<Transaction>>,
}

impl FifoTransactionPool {
    pub fn new(txs: Vec<Transaction>) -> Self {
        Self { queue: Mutex::new(txs.into()) }
    }
}

impl TransactionPool for FifoTransactionPool {
    fn get(&self, n: usize) -> Vec<Transaction> {
        let mut queue = self.queue.lock().unwrap();
        let take = n.min(queue.len());
        queue.drain(..take).collect()
    }
}

/// A toy signature scheme: the "private key" is a single byte, the public
/// key is its hash, and a signature is the hash of `pk || msg`. Not secure;
/// exists only to exercise `SignatureConsensus` without a real keypair.
#[derive(Clone)]
pub struct KeypairSigner {
    id: u8,
}

impl KeypairSigner {
    pub fn new(id: u8) -> Self {
        Self { id }
    }
}

impl SignatureScheme for KeypairSigner {
    fn public_key(&self) -> PublicKey {
        PublicKey(Hash::digest(&[self.id]).0)
    }

    fn sign(&self, msg: &[u8]) -> Signature {
        let mut bytes = self.public_key().0.to_vec();
        bytes.extend_from_slice(msg);
        Signature(Hash::digest(&bytes).0)
    }

    fn verify(pk: &PublicKey, msg: &[u8], sig: &Signature) -> bool {
        let mut bytes = pk.0.to_vec();
        bytes.extend_from_slice(msg);
        sig.0 == Hash::digest(&bytes).0
    }
}

/// A toy VRF: `id == 1` always draws the all-zero output (maximally
/// eligible, used to exercise the "fully staked proposer" path without
/// needing a real VRF construction); other ids draw a seed/slot-dependent
/// hash.
pub struct VrfSigner {
    id: u8,
}

impl VrfSigner {
    pub fn new(id: u8) -> Self {
        Self { id }
    }

    fn always_eligible_pubkey() -> PublicKey {
        PublicKey(Hash::digest(&[1u8]).0)
    }
}

impl VrfScheme for VrfSigner {
    fn public_key(&self) -> PublicKey {
        PublicKey(Hash::digest(&[self.id]).0)
    }

    fn evaluate(&self, seed: &[u8], slot: u64) -> VrfOutput {
        if self.id == 1 {
            return VrfOutput([0u8; 32]);
        }
        let mut bytes = seed.to_vec();
        bytes.extend_from_slice(&slot.to_le_bytes());
        bytes.push(self.id);
        VrfOutput(Hash::digest(&bytes).0)
    }

    fn verify(pk: &PublicKey, seed: &[u8], slot: u64, output: &VrfOutput) -> bool {
        if *pk == Self::always_eligible_pubkey() {
            return *output == VrfOutput([0u8; 32]);
        }
        let _ = (seed, slot);
        true
    }
}

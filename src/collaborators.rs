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

//! Collaborator interfaces consumed by the core but implemented elsewhere
//! (spec.md section 6, "Collaborator interfaces consumed"). The ledger, the
//! transaction pool, the signature scheme and the proving backend are all
//! out of scope for this crate; only their contracts live here.

use crate::error::Result;
use crate::hash::Hash;

/// A transaction as the core sees it: opaque payload plus whatever the
/// ledger needs to validate and apply it. The real transaction format is
/// a collaborator concern (spec.md section 1).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transaction {
    pub id: u64,
    pub payload: Vec<u8>,
}

/// `Ledger: hash() -> LedgerHash; apply(tx) -> Result<()>` (spec.md section 6).
///
/// `snapshot` realizes the "logical snapshot" requirement of spec.md
/// section 5: the bundle builder takes an owned copy before running, so
/// concurrent mutation of the live ledger by the chain controller never
/// races with proving.
pub trait Ledger: Clone + Send + Sync + 'static {
    fn hash(&self) -> Hash;
    fn apply(&mut self, tx: &Transaction) -> Result<()>;

    fn snapshot(&self) -> Self {
        self.clone()
    }
}

/// `TransactionPool: get(n) -> list<Tx>` (spec.md section 6). Implementations
/// are responsible for serializing concurrent `get` calls and removing
/// returned transactions atomically (spec.md section 5).
pub trait TransactionPool: Send + Sync + 'static {
    fn get(&self, n: usize) -> Vec<Transaction>;
}

/// An ed25519-shaped public key, opaque to the core beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

/// A signature over an arbitrary message, opaque to the core beyond
/// the `SignatureScheme::verify` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 32]);

/// `Signature: sign, verify` (spec.md section 6).
pub trait SignatureScheme {
    fn public_key(&self) -> PublicKey;
    fn sign(&self, msg: &[u8]) -> Signature;
    fn verify(pk: &PublicKey, msg: &[u8], sig: &Signature) -> bool;
}

/// The succinct proof produced for a ledger transition. Opaque payload;
/// the real proving system is out of scope (spec.md section 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerProof(pub Vec<u8>);

/// The public statement a `LedgerProof` attests to: "applying `transactions`
/// to the ledger that hashes to `from_ledger_hash` yields `to_ledger_hash`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub from_ledger_hash: Hash,
    pub to_ledger_hash: Hash,
    pub transactions: Vec<Transaction>,
}

/// A verifiable-random-function keypair (spec.md section 6's signature
/// scheme, specialized to the stake variant's per-slot eligibility draw).
pub trait VrfScheme {
    fn public_key(&self) -> PublicKey;
    fn evaluate(&self, seed: &[u8], slot: u64) -> crate::model::consensus_state::VrfOutput;
    fn verify(
        pk: &PublicKey,
        seed: &[u8],
        slot: u64,
        output: &crate::model::consensus_state::VrfOutput,
    ) -> bool;
}

/// `Proving backend: prove(pk, public_input, aux) -> Proof; verify(pk,
/// public_input, proof) -> bool` (spec.md section 6), specialized here to
/// the single statement shape the bundle builder proves.
///
/// `prove` is async: spec.md section 5 lists "inside the proving backend"
/// as a suspension point, so the bundle builder can race it against
/// cancellation instead of blocking until it resolves.
#[async_trait::async_trait]
pub trait ProvingBackend: Send + Sync + 'static {
    async fn prove(&self, statement: &Statement) -> Result<LedgerProof>;
    fn verify(statement: &Statement, proof: &LedgerProof) -> bool;
}

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

//! End-to-end mining coordinator scenarios, exercised through the public
//! API only (no internal test doubles -- those are crate-private).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use consensus_core::collaborators::{Ledger, LedgerProof, ProvingBackend, Statement, Transaction, TransactionPool};
use consensus_core::coordinator::{run, DEFAULT_TRANSACTIONS_PER_BUNDLE};
use consensus_core::difficulty::Difficulty;
use consensus_core::error::{ConsensusError, Result};
use consensus_core::hash::Hash;
use consensus_core::model::consensus_state::SignatureConsensusState;
use consensus_core::model::protocol_state::{BlockchainState, ProtocolState};
use consensus_core::model::tip::{Tip, TipChange};

#[derive(Clone)]
struct Ledger1 {
    hash: Hash,
}

impl Ledger1 {
    fn genesis() -> Self {
        Self { hash: Hash::digest(b"scenario-genesis") }
    }
}

impl Ledger for Ledger1 {
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

fn apply_all(ledger: &Ledger1, txs: &[Transaction]) -> Ledger1 {
    let mut applied = ledger.snapshot();
    for tx in txs {
        applied.apply(tx).expect("scenario transactions are always well-formed");
    }
    applied
}

struct DigestProvingBackend;

fn statement_digest(statement: &Statement) -> Hash {
    let mut bytes = statement.from_ledger_hash.0.to_vec();
    bytes.extend_from_slice(&statement.to_ledger_hash.0);
    for tx in &statement.transactions {
        bytes.extend_from_slice(&tx.id.to_le_bytes());
        bytes.extend_from_slice(&tx.payload);
    }
    Hash::digest(&bytes)
}

#[async_trait]
impl ProvingBackend for DigestProvingBackend {
    async fn prove(&self, statement: &Statement) -> Result<LedgerProof> {
        Ok(LedgerProof(statement_digest(statement).0.to_vec()))
    }

    fn verify(statement: &Statement, proof: &LedgerProof) -> bool {
        proof.0 == statement_digest(statement).0.to_vec()
    }
}

struct FixedPool {
    queue: Mutex<VecDeque<Transaction>>,
}

impl FixedPool {
    fn new(txs: Vec<Transaction>) -> Self {
        Self { queue: Mutex::new(txs.into()) }
    }
}

impl TransactionPool for FixedPool {
    fn get(&self, n: usize) -> Vec<Transaction> {
        let mut queue = self.queue.lock().unwrap();
        let take = n.min(queue.len());
        queue.drain(..take).collect()
    }
}

fn tip_with_pool(difficulty: Difficulty, pool: FixedPool) -> Tip<SignatureConsensusState, Ledger1, FixedPool> {
    let ledger = Ledger1::genesis();
    Tip {
        state: ProtocolState {
            previous_state_hash: Hash([0u8; 32]),
            blockchain_state: BlockchainState { staged_ledger_hash: ledger.hash(), timestamp: 0 },
            consensus_state: SignatureConsensusState::genesis(ledger.hash(), 0, difficulty),
        },
        ledger,
        transaction_pool: Arc::new(pool),
    }
}

/// S1: genesis tip, difficulty = MAX (every digest accepted), pool holds
/// three transactions. The coordinator must emit exactly one
/// `TransitionWithWitness` whose ledger hash matches applying all three
/// transactions to the genesis ledger, whose proof verifies against that
/// statement, and whose nonce satisfies the genesis difficulty target.
#[test]
fn s1_genesis_tip_with_max_difficulty_emits_one_witness_over_three_transactions() {
    smol::block_on(async {
        let txs = vec![
            Transaction { id: 1, payload: vec![1] },
            Transaction { id: 2, payload: vec![2] },
            Transaction { id: 3, payload: vec![3] },
        ];
        let genesis_ledger = Ledger1::genesis();
        let expected_ledger_hash = apply_all(&genesis_ledger, &txs).hash();

        let (tx, rx) = async_channel::bounded(1);
        tx.send(TipChange(tip_with_pool(Difficulty::MAX, FixedPool::new(txs.clone())))).await.unwrap();

        let handle = run(rx, Arc::new(DigestProvingBackend), DEFAULT_TRANSACTIONS_PER_BUNDLE);
        let output = handle.output();
        let witness = output.recv().await.expect("expected one emission");

        assert_eq!(witness.transactions, txs);
        assert_eq!(witness.transition.ledger_hash, expected_ledger_hash);

        let expected_statement = Statement {
            from_ledger_hash: genesis_ledger.hash(),
            to_ledger_hash: expected_ledger_hash,
            transactions: txs,
        };
        assert!(DigestProvingBackend::verify(&expected_statement, &witness.transition.ledger_proof));

        handle.stop();
        tx.close();
        let _ = handle.join().await;
    });
}

/// S2: two sequential `TipChange` events 50ms apart against an unsolvable
/// difficulty target. The first attempt must be cancelled with no
/// emission; the second must proceed and eventually emit against the new
/// tip's transactions.
#[test]
fn s2_second_tip_change_supersedes_an_unsolvable_first_attempt() {
    smol::block_on(async {
        let (tx, rx) = async_channel::bounded(2);
        tx.send(TipChange(tip_with_pool(Difficulty::NONE, FixedPool::new(vec![Transaction { id: 1, payload: vec![] }]))))
            .await
            .unwrap();

        let handle = run(rx, Arc::new(DigestProvingBackend), DEFAULT_TRANSACTIONS_PER_BUNDLE);
        smol::Timer::after(Duration::from_millis(50)).await;

        let second_txs = vec![Transaction { id: 7, payload: vec![9, 9] }];
        tx.send(TipChange(tip_with_pool(Difficulty::MAX, FixedPool::new(second_txs.clone())))).await.unwrap();

        let output = handle.output();
        let witness = output.recv().await.expect("second tip should eventually resolve");
        assert_eq!(witness.transactions, second_txs);

        handle.stop();
        tx.close();
        let _ = handle.join().await;
    });
}

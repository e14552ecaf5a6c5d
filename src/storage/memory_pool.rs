use crate::core::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pending transactions in arrival order.
///
/// The pool does not validate anything: the `Blockchain` checks a transaction
/// (including that its hash is not already pending) before calling `add`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPool {
    pending_transactions: Vec<Transaction>,
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool {
            pending_transactions: Vec::new(),
        }
    }

    pub fn add(&mut self, tx: Transaction) {
        self.pending_transactions.push(tx);
    }

    /// Snapshot of the pending list. Changes to it do not reach the pool.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.pending_transactions.clone()
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.contains_hash(&tx.hash())
    }

    pub fn contains_hash(&self, hash: &str) -> bool {
        self.pending_transactions.iter().any(|tx| tx.hash() == hash)
    }

    /// Whether some pending transaction already spends this output.
    pub fn spends(&self, transaction_id: &str, output_index: u32) -> bool {
        self.pending_transactions.iter().any(|tx| {
            tx.get_inputs().iter().any(|input| {
                input.get_transaction_id() == transaction_id
                    && input.get_output_index() == output_index
            })
        })
    }

    /// Up to `limit` pending transactions, highest fee first. Equal fees keep
    /// their arrival order.
    pub fn select_by_fee(&self, limit: usize) -> Vec<Transaction> {
        let mut selected = self.transactions();
        selected.sort_by(|a, b| b.get_fee().cmp(&a.get_fee()));
        selected.truncate(limit);
        selected
    }

    /// Drop every pending transaction whose hash matches one of `confirmed`.
    pub fn purge_confirmed(&mut self, confirmed: &[Transaction]) {
        let confirmed: HashSet<String> = confirmed.iter().map(Transaction::hash).collect();
        self.pending_transactions
            .retain(|tx| !confirmed.contains(&tx.hash()));
    }

    pub fn remove(&mut self, hash: &str) -> Option<Transaction> {
        let idx = self
            .pending_transactions
            .iter()
            .position(|tx| tx.hash() == hash)?;
        Some(self.pending_transactions.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.pending_transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_transactions.is_empty()
    }
}

use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

/// One spendable output, addressed by the transaction that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UTXO {
    pub transaction_id: String,
    pub output_index: u32,
    pub address: String,
    pub amount: u64,
}

/// Index of unspent outputs keyed by `(transaction_id, output_index)`.
///
/// Entries are kept in the order they were created so that coin selection is
/// deterministic. Lookups are linear scans, which is fine at this scale.
///
/// The set is pure derived state: replaying every block through
/// [`UTXOSet::apply_transaction`] from an empty set must reproduce it exactly.
#[derive(Debug, Clone, Default)]
pub struct UTXOSet {
    utxos: Vec<UTXO>,
}

impl UTXOSet {
    pub fn new() -> UTXOSet {
        UTXOSet { utxos: Vec::new() }
    }

    /// Build a set from scratch by replaying blocks in order.
    pub fn rebuild(blocks: &[Block]) -> UTXOSet {
        let mut utxo_set = UTXOSet::new();
        for block in blocks {
            for tx in block.get_transactions() {
                utxo_set.apply_transaction(tx);
            }
        }
        utxo_set
    }

    fn position(&self, transaction_id: &str, output_index: u32) -> Option<usize> {
        self.utxos
            .iter()
            .position(|u| u.transaction_id == transaction_id && u.output_index == output_index)
    }

    pub fn exists(&self, transaction_id: &str, output_index: u32) -> bool {
        self.position(transaction_id, output_index).is_some()
    }

    pub fn get(&self, transaction_id: &str, output_index: u32) -> Option<&UTXO> {
        self.position(transaction_id, output_index)
            .map(|idx| &self.utxos[idx])
    }

    /// Insert an output. Re-adding an existing key replaces it in place.
    pub fn add(&mut self, utxo: UTXO) {
        match self.position(&utxo.transaction_id, utxo.output_index) {
            Some(idx) => self.utxos[idx] = utxo,
            None => self.utxos.push(utxo),
        }
    }

    /// Remove an output. Removing a key that is not present is a no-op.
    pub fn remove_by_id(&mut self, transaction_id: &str, output_index: u32) -> Option<UTXO> {
        self.position(transaction_id, output_index)
            .map(|idx| self.utxos.remove(idx))
    }

    /// Spend a transaction's inputs and record its outputs under its content hash.
    pub fn apply_transaction(&mut self, tx: &Transaction) {
        for input in tx.get_inputs() {
            self.remove_by_id(input.get_transaction_id(), input.get_output_index());
        }

        let transaction_id = tx.hash();
        for (idx, output) in tx.get_outputs().iter().enumerate() {
            self.add(UTXO {
                transaction_id: transaction_id.clone(),
                output_index: idx as u32,
                address: output.get_address().to_string(),
                amount: output.get_amount(),
            });
        }
    }

    pub fn find_by_address(&self, address: &str) -> Vec<&UTXO> {
        self.utxos.iter().filter(|u| u.address == address).collect()
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        self.find_by_address(address)
            .iter()
            .fold(0u64, |acc, u| acc.saturating_add(u.amount))
    }

    /// Greedy coin selection: walk the address's outputs in creation order and
    /// stop as soon as the running total reaches `target`.
    pub fn select_spendable(&self, address: &str, target: u64) -> Result<Vec<UTXO>> {
        let mut accumulated = 0u64;
        let mut selected = Vec::new();

        for utxo in self.find_by_address(address) {
            if accumulated >= target {
                break;
            }
            accumulated = accumulated.saturating_add(utxo.amount);
            selected.push(utxo.clone());
        }

        if accumulated < target {
            return Err(BlockchainError::InsufficientFunds {
                required: target,
                available: accumulated,
            });
        }
        Ok(selected)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UTXO> {
        self.utxos.iter()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Same entries regardless of the order they were created in.
    pub fn same_entries(&self, other: &UTXOSet) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.utxos
            .iter()
            .all(|u| other.get(&u.transaction_id, u.output_index) == Some(u))
    }
}

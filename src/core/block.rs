use crate::core::{ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::current_timestamp;
use log::info;
use serde::{Deserialize, Serialize};

/// A block moves through three states: assembling (transactions still being
/// added, no hash), sealed (nonce found, hash stored) and committed (appended to
/// a chain). A sealed block refuses new transactions; editing one behind its
/// back leaves a stored hash that no longer matches its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    timestamp: i64, // Milliseconds since the Unix epoch
    transactions: Vec<Transaction>,
    prev_block_hash: String, // Empty for the genesis block
    block_hash: String,
    nonce: u64,
    difficulty: u32,
}

impl Block {
    pub fn new(prev_block_hash: String) -> Result<Block> {
        Ok(Block {
            timestamp: current_timestamp()?,
            transactions: Vec::new(),
            prev_block_hash,
            block_hash: String::new(),
            nonce: 0,
            difficulty: 0,
        })
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        if self.is_sealed() {
            return Err(BlockchainError::InvalidBlock(format!(
                "Block {} is already sealed",
                self.block_hash
            )));
        }
        self.transactions.push(transaction);
        Ok(())
    }

    /// Search for a nonce giving `difficulty` leading zero hex digits, then seal.
    pub fn mine(&mut self, difficulty: u32) -> Result<()> {
        if self.is_sealed() {
            return Err(BlockchainError::InvalidBlock(format!(
                "Block {} is already sealed",
                self.block_hash
            )));
        }

        self.difficulty = difficulty;
        info!(
            "Starting proof-of-work for block with {} transactions (difficulty: {difficulty})",
            self.transactions.len()
        );
        let pow = ProofOfWork::new_proof_of_work(self, difficulty)?;
        let (nonce, hash) = pow.run();
        self.nonce = nonce;
        self.block_hash = hash;
        info!(
            "Proof-of-work completed for block: {} (nonce: {nonce})",
            self.block_hash
        );
        Ok(())
    }

    /// Hash recomputed from the current fields.
    pub fn calculate_hash(&self) -> Result<String> {
        let pow = ProofOfWork::new_proof_of_work(self, self.difficulty)?;
        Ok(pow.hash_with_nonce(self.nonce))
    }

    /// True only when the stored hash has the difficulty prefix and equals a
    /// fresh recomputation.
    pub fn is_hash_valid(&self) -> bool {
        ProofOfWork::validate(self)
    }

    pub fn is_sealed(&self) -> bool {
        !self.block_hash.is_empty()
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_block_hash.is_empty()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_prev_block_hash(&self) -> &str {
        self.prev_block_hash.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.block_hash.as_str()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    /// Sum of the fees of every non-coinbase transaction in the block.
    pub fn total_fees(&self) -> u64 {
        self.transactions
            .iter()
            .filter(|tx| !tx.is_coinbase())
            .fold(0u64, |acc, tx| acc.saturating_add(tx.get_fee()))
    }

    /// Create a sealed-looking block with a chosen timestamp (for testing only)
    #[cfg(test)]
    pub(crate) fn new_test_block(timestamp: i64, difficulty: u32) -> Block {
        Block {
            timestamp,
            transactions: Vec::new(),
            prev_block_hash: "test_prev_hash".to_string(),
            block_hash: "test_hash".to_string(),
            nonce: 0,
            difficulty,
        }
    }

    #[cfg(test)]
    pub(crate) fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        &mut self.transactions
    }
}

// This is the ledger itself - one owning aggregate for the block list, the live
// UTXO set and the mempool. Every mutation goes through its methods, so there is
// exactly one place where admission and mining touch shared state
//
// The UTXO set and the mempool are working state. The block list is the only
// thing that is ever trusted: reloading or validating replays it from scratch

use crate::core::validation::{self, validate_coinbase_shape, validate_spend};
use crate::core::{Block, ConsensusParams, DifficultyAdjustment, Transaction};
use crate::error::{BlockchainError, Result};
use crate::storage::{ledger_file, MemoryPool, UTXOSet};
use crate::utils::{EcdsaVerifier, SignatureVerifier};
use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    utxo_set: UTXOSet,
    mempool: MemoryPool,
    params: ConsensusParams,
    verifier: Arc<dyn SignatureVerifier>, // ECDSA in production, swappable in tests
}

impl Blockchain {
    // When I want a fresh ledger, I mine the genesis block right away so the
    // genesis address starts out holding the first reward
    pub fn new(genesis_address: &str, params: ConsensusParams) -> Result<Blockchain> {
        Self::with_verifier(genesis_address, params, Arc::new(EcdsaVerifier))
    }

    pub fn with_verifier(
        genesis_address: &str,
        params: ConsensusParams,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<Blockchain> {
        let mut blockchain = Self::empty_with_verifier(params, verifier);
        info!("Creating genesis block for address: {genesis_address}");
        blockchain.mine_block(genesis_address)?;
        Ok(blockchain)
    }

    /// A ledger with no blocks at all. The first `mine_block` call produces genesis.
    pub fn empty(params: ConsensusParams) -> Blockchain {
        Self::empty_with_verifier(params, Arc::new(EcdsaVerifier))
    }

    pub fn empty_with_verifier(
        params: ConsensusParams,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Blockchain {
        Blockchain {
            blocks: Vec::new(),
            utxo_set: UTXOSet::new(),
            mempool: MemoryPool::new(),
            params,
            verifier,
        }
    }

    /// Reassemble a ledger from persisted parts.
    ///
    /// The UTXO set is rebuilt by replaying `blocks`, then the whole chain is
    /// validated. A chain that does not replay cleanly is an `InvalidChain`
    /// error and no ledger is returned. Persisted pending transactions go
    /// through admission again, and any that would not be admitted now are
    /// dropped with a warning.
    pub fn from_parts(
        blocks: Vec<Block>,
        mempool: MemoryPool,
        params: ConsensusParams,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<Blockchain> {
        if let Err(e) = validation::validate_chain(&blocks, &params, verifier.as_ref()) {
            error!("Refusing to load ledger: {e}");
            return Err(match e {
                BlockchainError::InvalidChain(_) => e,
                other => BlockchainError::InvalidChain(other.to_string()),
            });
        }

        let utxo_set = UTXOSet::rebuild(&blocks);
        let mut blockchain = Blockchain {
            blocks,
            utxo_set,
            mempool: MemoryPool::new(),
            params,
            verifier,
        };

        for tx in mempool.transactions() {
            let hash = tx.hash();
            match blockchain.check_admission(&tx, &hash) {
                Ok(()) => blockchain.mempool.add(tx),
                Err(e) => warn!("Dropping persisted transaction {hash}: {e}"),
            }
        }

        info!(
            "Loaded ledger with {} blocks, {} unspent outputs and {} pending transactions",
            blockchain.blocks.len(),
            blockchain.utxo_set.len(),
            blockchain.mempool.len()
        );
        Ok(blockchain)
    }

    pub fn load_from_file(path: impl AsRef<Path>, params: ConsensusParams) -> Result<Blockchain> {
        ledger_file::load(path, params, Arc::new(EcdsaVerifier))
    }

    pub fn load_from_file_with_verifier(
        path: impl AsRef<Path>,
        params: ConsensusParams,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<Blockchain> {
        ledger_file::load(path, params, verifier)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        ledger_file::save(self, path)
    }

    /// Submit a transaction to the mempool.
    ///
    /// A rejection is returned as an `Err` and logged; the ledger is left
    /// exactly as it was.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        let hash = tx.hash();
        match self.check_admission(&tx, &hash) {
            Ok(()) => {
                info!(
                    "Accepted transaction {hash} into mempool (fee: {})",
                    tx.get_fee()
                );
                self.mempool.add(tx);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected transaction {hash}: {e}");
                Err(e)
            }
        }
    }

    fn check_admission(&self, tx: &Transaction, hash: &str) -> Result<()> {
        if self.mempool.contains_hash(hash) {
            return Err(BlockchainError::Transaction(
                "Transaction is already pending".to_string(),
            ));
        }

        if tx.is_coinbase() {
            validate_coinbase_shape(tx)?;
            // Its outputs would overwrite the ones already recorded under this id
            if self.find_transaction(hash).is_some() {
                return Err(BlockchainError::Transaction(
                    "Coinbase transaction is already confirmed".to_string(),
                ));
            }
            return Ok(());
        }

        if tx.get_fee() < self.params.min_fee {
            return Err(BlockchainError::Transaction(format!(
                "Fee {} is below the minimum of {}",
                tx.get_fee(),
                self.params.min_fee
            )));
        }

        let recipient = tx
            .recipient()
            .ok_or_else(|| BlockchainError::Transaction("Transaction has no outputs".to_string()))?;
        if recipient.get_amount() == 0 {
            return Err(BlockchainError::Transaction(
                "Amount must be positive".to_string(),
            ));
        }
        if recipient.get_address().is_empty() {
            return Err(BlockchainError::InvalidAddress(
                "Recipient address cannot be empty".to_string(),
            ));
        }
        if tx.sender_address().as_deref() == Some(recipient.get_address()) {
            return Err(BlockchainError::Transaction(
                "Sender and recipient cannot be the same".to_string(),
            ));
        }

        validate_spend(tx, &self.utxo_set, self.verifier.as_ref())?;

        for input in tx.get_inputs() {
            if self
                .mempool
                .spends(input.get_transaction_id(), input.get_output_index())
            {
                return Err(BlockchainError::Transaction(format!(
                    "Output {}:{} is already spent by a pending transaction",
                    input.get_transaction_id(),
                    input.get_output_index()
                )));
            }
        }
        Ok(())
    }

    /// Assemble, mine and commit the next block, paying `miner_address`.
    ///
    /// Returns `Ok(None)` without touching anything when the chain already has
    /// a genesis block and nothing is pending.
    pub fn mine_block(&mut self, miner_address: &str) -> Result<Option<Block>> {
        if self.mempool.is_empty() && !self.blocks.is_empty() {
            debug!("Mempool is empty, nothing to mine");
            return Ok(None);
        }
        if miner_address.is_empty() {
            return Err(BlockchainError::InvalidAddress(
                "Miner address cannot be empty".to_string(),
            ));
        }

        let mut transactions = self.select_transactions();

        let height = self.height();
        let fees = transactions
            .iter()
            .filter(|tx| !tx.is_coinbase())
            .fold(0u64, |acc, tx| acc.saturating_add(tx.get_fee()));
        let reward = self.params.block_reward.saturating_add(fees);
        let coinbase = Transaction::new_coinbase(
            miner_address,
            reward,
            &format!("Coinbase reward for block {height}"),
        );

        // A pending coinbase identical to this block's reward would share its id.
        // Coinbases never count toward fees, so dropping one leaves the reward as is
        let coinbase_id = coinbase.hash();
        if let Some(pos) = transactions.iter().position(|tx| tx.hash() == coinbase_id) {
            transactions.remove(pos);
            warn!(
                "Evicting transaction {coinbase_id} from mempool: it duplicates the block reward"
            );
            self.mempool.remove(&coinbase_id);
        }

        if transactions.is_empty() && !self.blocks.is_empty() {
            info!("No pending transaction survived re-validation, nothing to mine");
            return Ok(None);
        }

        let difficulty = self.calculate_difficulty();
        info!(
            "Mining block {height} with {} transactions (difficulty: {difficulty}, fees: {fees})",
            transactions.len() + 1
        );

        let mut block = Block::new(self.tip_hash().to_string())?;
        block.add_transaction(coinbase)?;
        for tx in transactions {
            block.add_transaction(tx)?;
        }
        block.mine(difficulty)?;

        for tx in block.get_transactions() {
            self.utxo_set.apply_transaction(tx);
        }
        self.mempool.purge_confirmed(block.get_transactions());
        self.blocks.push(block.clone());

        info!("Successfully mined block {height}: {}", block.get_hash());
        Ok(Some(block))
    }

    // I pick by fee, then check each pick again against a scratch copy of the
    // UTXO set with the earlier picks already applied. Anything that no longer
    // fits is dropped from the mempool for good
    fn select_transactions(&mut self) -> Vec<Transaction> {
        let mut scratch = self.utxo_set.clone();
        let mut selected = Vec::new();

        for tx in self
            .mempool
            .select_by_fee(self.params.max_block_transactions)
        {
            let hash = tx.hash();
            // A confirmed non-coinbase already fails on its spent inputs
            let verdict = if tx.is_coinbase() && self.find_transaction(&hash).is_some() {
                Err(BlockchainError::Transaction(
                    "Coinbase transaction is already confirmed".to_string(),
                ))
            } else {
                validation::validate_transaction(
                    &tx,
                    &scratch,
                    &self.params,
                    self.verifier.as_ref(),
                )
            };

            match verdict {
                Ok(()) => {
                    scratch.apply_transaction(&tx);
                    selected.push(tx);
                }
                Err(e) => {
                    warn!("Evicting transaction {hash} from mempool: {e}");
                    self.mempool.remove(&hash);
                }
            }
        }
        selected
    }

    /// Difficulty the next block will be mined at.
    pub fn calculate_difficulty(&self) -> u32 {
        DifficultyAdjustment::calculate_next_difficulty(&self.blocks, &self.params)
    }

    /// Replay the whole chain from an empty UTXO set. Never consults live state.
    pub fn is_blockchain_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(e) => {
                error!("Blockchain validation failed: {e}");
                false
            }
        }
    }

    /// Same replay as [`Blockchain::is_blockchain_valid`], keeping the reason.
    pub fn validate(&self) -> Result<()> {
        validation::validate_chain(&self.blocks, &self.params, self.verifier.as_ref())
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn height(&self) -> usize {
        self.blocks.len()
    }

    /// Hash of the last block, or `""` before genesis.
    pub fn tip_hash(&self) -> &str {
        self.blocks.last().map(Block::get_hash).unwrap_or_default()
    }

    pub fn utxo_set(&self) -> &UTXOSet {
        &self.utxo_set
    }

    pub fn mempool(&self) -> &MemoryPool {
        &self.mempool
    }

    pub fn get_params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        self.utxo_set.balance_of(address)
    }

    /// Look up a committed transaction by its hex id.
    pub fn find_transaction(&self, transaction_id: &str) -> Option<&Transaction> {
        self.blocks
            .iter()
            .flat_map(Block::get_transactions)
            .find(|tx| tx.hash() == transaction_id)
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

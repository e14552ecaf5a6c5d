//! Core ledger functionality
//!
//! This module contains the fundamental ledger components: transactions,
//! blocks and their proof-of-work, difficulty retargeting, the consensus
//! rules and the `Blockchain` aggregate that ties them together.

pub mod block;
pub mod blockchain;
pub mod difficulty;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;
pub mod validation;

pub use block::Block;
pub use blockchain::Blockchain;
pub use difficulty::{DifficultyAdjustment, MIN_DIFFICULTY};
pub use monetary::{
    ConsensusParams, ADJUSTMENT_INTERVAL, BLOCK_REWARD, COINS_PER_UNIT, INITIAL_DIFFICULTY,
    MAX_BLOCK_TRANSACTIONS, MIN_FEE, TARGET_BLOCK_TIME_MS,
};
pub use proof_of_work::{ProofOfWork, MAX_DIFFICULTY};
pub use transaction::{TXInput, TXOutput, Transaction};
pub use validation::{validate_chain, validate_spend, validate_transaction};

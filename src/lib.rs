//! # UTXO Ledger - A Single-Node Consensus Engine
//!
//! A ledger of UTXO-model transactions, sealed into a hash-linked chain by
//! proof-of-work. When I come back to this code, here's what I need to remember:
//!
//! ## What It Does
//! - **Transactions**: inputs point at earlier outputs, each signed per input
//!   with ECDSA P-256; a transaction with no inputs is a coinbase
//! - **UTXO Set**: the unspent outputs, rebuilt from the blocks whenever needed
//! - **Mempool**: admitted transactions waiting for a block, mined by fee
//! - **Mining**: leading-zero hex proof-of-work with a retarget every block
//!   once the first window is full
//! - **Validation**: a full replay from an empty UTXO set that never trusts
//!   live state, so any edit to a committed block is caught
//! - **Persistence**: blocks and mempool as a JSON document; reloading replays
//!   and validates before handing back a ledger
//!
//! ## How I Organized My Code
//! - `core/`: transactions, blocks, proof-of-work, difficulty, consensus rules, `Blockchain`
//! - `storage/`: UTXO set, mempool, ledger file
//! - `wallet/`: key pairs, addresses, building and signing payments
//! - `config/`: file locations and consensus parameters
//! - `utils/`: hashing, encodings, the signature verifier capability
//! - `cli/`: command-line parsing for the binary
//!
//! ## When I Need to Understand Something
//! 1. `core/blockchain.rs` for admission and mining
//! 2. `core/validation.rs` for what makes a chain valid
//! 3. `core/transaction.rs` for hashing and signature scope
//! 4. `wallet/wallet.rs` for how a payment gets built

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, Settings, GLOBAL_CONFIG};
pub use core::{
    Block, Blockchain, ConsensusParams, DifficultyAdjustment, ProofOfWork, TXInput, TXOutput,
    Transaction,
};
pub use error::{BlockchainError, Result};
pub use storage::{LedgerSnapshot, MemoryPool, UTXOSet, UTXO};
pub use utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, sha256_digest, EcdsaVerifier,
    SignatureVerifier,
};
pub use wallet::{address_from_public_key, build_transaction, validate_address, Wallet, Wallets};

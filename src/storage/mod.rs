//! Ledger state and persistence
//!
//! This module holds the working state the `Blockchain` owns (the UTXO set
//! and the memory pool of pending transactions) and the JSON file the
//! ledger is saved to and reloaded from.

pub mod ledger_file;
pub mod memory_pool;
pub mod utxo_set;

pub use ledger_file::{LedgerSnapshot, LEDGER_FILE};
pub use memory_pool::MemoryPool;
pub use utxo_set::{UTXOSet, UTXO};

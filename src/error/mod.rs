//! Error handling for the ledger
//!
//! One error type covers every layer: rejected transactions, failed chain
//! validation, persistence and the wallet/key collaborators.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Cryptographic operation errors (key generation, signing)
    Crypto(String),
    /// Structurally malformed transaction (amount, fee, recipient, duplicates)
    Transaction(String),
    /// Missing or invalid input signature
    Signature(String),
    /// An input references an output that is not in the UTXO set
    MissingUtxo {
        transaction_id: String,
        output_index: u32,
    },
    /// An input spends an output owned by a different address
    OwnershipMismatch {
        transaction_id: String,
        output_index: u32,
        owner: String,
        spender: String,
    },
    /// Insufficient funds for transaction
    InsufficientFunds { required: u64, available: u64 },
    /// Block hash or linkage errors
    InvalidBlock(String),
    /// A persisted chain that does not replay cleanly
    InvalidChain(String),
    /// Wallet operation errors
    Wallet(String),
    /// Invalid address format
    InvalidAddress(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            BlockchainError::Signature(msg) => write!(f, "Signature error: {msg}"),
            BlockchainError::MissingUtxo {
                transaction_id,
                output_index,
            } => write!(f, "Unspent output not found: {transaction_id}:{output_index}"),
            BlockchainError::OwnershipMismatch {
                transaction_id,
                output_index,
                owner,
                spender,
            } => write!(
                f,
                "Output {transaction_id}:{output_index} belongs to {owner}, not {spender}"
            ),
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::InvalidChain(msg) => write!(f, "Invalid chain: {msg}"),
            BlockchainError::Wallet(msg) => write!(f, "Wallet error: {msg}"),
            BlockchainError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl BlockchainError {
    /// True for errors that reject a transaction without harming the ledger.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BlockchainError::Transaction(_)
                | BlockchainError::Signature(_)
                | BlockchainError::MissingUtxo { .. }
                | BlockchainError::OwnershipMismatch { .. }
                | BlockchainError::InsufficientFunds { .. }
        )
    }
}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

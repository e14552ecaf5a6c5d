//! Wallet management and cryptographic operations
//!
//! This module handles key pairs, address derivation, building and signing
//! transactions, and the on-disk key store. None of it is part of the ledger
//! core: the ledger only ever receives finished `Transaction` values.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{
    address_from_public_key, build_transaction, validate_address, Wallet, ADDRESS_LEN,
};
pub use wallets::{Wallets, WALLET_FILE};

//! Utility functions and helpers
//!
//! This module contains cryptographic utilities, encoding functions,
//! and the serialization helpers used throughout the ledger.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, sha256_digest, EcdsaVerifier,
    SignatureVerifier,
};

pub use serialization::{deserialize, from_json, serialize, to_json, to_json_pretty};

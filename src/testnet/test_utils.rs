//! Test utilities for ledger testing

use crate::core::{Blockchain, ConsensusParams, Transaction};
use crate::error::Result;
use crate::utils::{sha256_digest, SignatureVerifier};
use crate::wallet::{address_from_public_key, build_transaction};
use std::sync::Arc;

/// Deterministic stand-in for ECDSA: a signature is `sha256(public_key ‖ message)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeVerifier;

impl SignatureVerifier for FakeVerifier {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        fake_signature(public_key, message) == signature
    }
}

fn fake_signature(public_key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut data = public_key.to_vec();
    data.extend_from_slice(message);
    sha256_digest(&data)
}

/// A 65-byte uncompressed-point lookalike, distinct per seed
pub fn fake_public_key(seed: u8) -> Vec<u8> {
    let mut key = vec![0x04];
    key.extend(std::iter::repeat(seed).take(64));
    key
}

pub fn fake_address(seed: u8) -> String {
    address_from_public_key(&fake_public_key(seed))
}

/// Sign every input with the fake scheme, using the key already on the input.
pub fn fake_sign(tx: &mut Transaction) {
    for input in tx.inputs_mut() {
        let signature = fake_signature(input.get_public_key(), &input.digest());
        input.set_signature(&signature);
    }
}

/// Cheap consensus rules: difficulty 1, a reward of 100 units and a fee floor of 1
pub fn test_params() -> ConsensusParams {
    ConsensusParams {
        initial_difficulty: 1,
        adjustment_interval: 5,
        target_block_time_ms: 1_000,
        min_fee: 1,
        block_reward: 100,
        max_block_transactions: 10,
    }
}

/// A ledger whose genesis reward went to `fake_address(genesis_seed)`
pub fn create_test_blockchain(genesis_seed: u8) -> Result<Blockchain> {
    create_test_blockchain_with(genesis_seed, test_params())
}

pub fn create_test_blockchain_with(genesis_seed: u8, params: ConsensusParams) -> Result<Blockchain> {
    Blockchain::with_verifier(&fake_address(genesis_seed), params, Arc::new(FakeVerifier))
}

/// Build and fake-sign a payment from `fake_address(from_seed)` using the
/// ledger's current UTXO set.
pub fn create_test_transaction(
    blockchain: &Blockchain,
    from_seed: u8,
    to: &str,
    amount: u64,
    fee: u64,
) -> Result<Transaction> {
    let mut tx = build_transaction(
        &fake_public_key(from_seed),
        to,
        amount,
        fee,
        blockchain.utxo_set(),
        None,
    )?;
    fake_sign(&mut tx);
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_verifier_round_trip() {
        let key = fake_public_key(7);
        let signature = fake_signature(&key, b"digest");
        assert!(FakeVerifier.verify(&key, b"digest", &signature));
        assert!(!FakeVerifier.verify(&fake_public_key(8), b"digest", &signature));
        assert!(!FakeVerifier.verify(&key, b"other", &signature));
    }

    #[test]
    fn test_fake_addresses_are_distinct() {
        assert_ne!(fake_address(1), fake_address(2));
        assert_eq!(fake_address(1), fake_address(1));
    }
}

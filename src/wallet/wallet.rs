use crate::core::{TXInput, TXOutput, Transaction};
use crate::error::{BlockchainError, Result};
use crate::storage::UTXOSet;
use crate::utils::{base58_decode, base58_encode, ecdsa_p256_sha256_sign_digest, sha256_digest};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use serde::{Deserialize, Serialize};

/// Length of a decoded address: one SHA-256 digest
pub const ADDRESS_LEN: usize = 32;

// The private key lives only here. The ledger sees public keys and signatures.
#[derive(Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = crate::utils::new_key_pair()?;
        Wallet::from_pkcs8(&pkcs8)
    }

    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Wallet> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &rng)
            .map_err(|e| {
                BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
            })?;
        let public_key = key_pair.public_key().as_ref().to_vec();
        Ok(Wallet {
            pkcs8: pkcs8.to_vec(),
            public_key,
        })
    }

    pub fn get_address(&self) -> String {
        address_from_public_key(&self.public_key)
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }

    /// Build an unsigned payment from this wallet's spendable outputs.
    pub fn create_transaction(
        &self,
        to: &str,
        amount: u64,
        fee: u64,
        utxo_set: &UTXOSet,
        message: Option<&str>,
    ) -> Result<Transaction> {
        build_transaction(&self.public_key, to, amount, fee, utxo_set, message)
    }

    /// Sign every input over its own `(transaction_id, output_index)` digest.
    pub fn sign_transaction(&self, tx: &mut Transaction) -> Result<()> {
        for input in tx.inputs_mut() {
            if input.get_public_key() != self.public_key.as_slice() {
                return Err(BlockchainError::Wallet(format!(
                    "Input {}:{} is not owned by {}",
                    input.get_transaction_id(),
                    input.get_output_index(),
                    self.get_address()
                )));
            }
            let signature = ecdsa_p256_sha256_sign_digest(&self.pkcs8, &input.digest())?;
            input.set_signature(&signature);
        }
        Ok(())
    }
}

/// Address of a public key: base58 of SHA-256 applied twice.
pub fn address_from_public_key(public_key: &[u8]) -> String {
    let first_sha = sha256_digest(public_key);
    let second_sha = sha256_digest(&first_sha);
    base58_encode(&second_sha)
}

pub fn validate_address(address: &str) -> bool {
    match base58_decode(address) {
        Ok(payload) => payload.len() == ADDRESS_LEN,
        Err(_) => false,
    }
}

/// Assemble a payment of `amount` to `to` funded by the outputs owned by
/// `sender_public_key`'s address.
///
/// Outputs are picked greedily until `amount + fee` is covered; anything
/// above that comes back to the sender as a second, change output.
pub fn build_transaction(
    sender_public_key: &[u8],
    to: &str,
    amount: u64,
    fee: u64,
    utxo_set: &UTXOSet,
    message: Option<&str>,
) -> Result<Transaction> {
    if amount == 0 {
        return Err(BlockchainError::Transaction(
            "Amount must be positive".to_string(),
        ));
    }
    if to.is_empty() {
        return Err(BlockchainError::InvalidAddress(
            "Recipient address cannot be empty".to_string(),
        ));
    }

    let from = address_from_public_key(sender_public_key);
    if from == to {
        return Err(BlockchainError::Transaction(
            "Sender and recipient cannot be the same".to_string(),
        ));
    }

    let total_needed = amount
        .checked_add(fee)
        .ok_or_else(|| BlockchainError::Transaction("Amount plus fee overflows".to_string()))?;
    let spendable = utxo_set.select_spendable(&from, total_needed)?;

    let mut accumulated = 0u64;
    let mut inputs = Vec::with_capacity(spendable.len());
    for utxo in &spendable {
        accumulated = accumulated.saturating_add(utxo.amount);
        inputs.push(TXInput::new(
            &utxo.transaction_id,
            utxo.output_index,
            sender_public_key,
        ));
    }

    let mut outputs = vec![TXOutput::new(to, amount)];
    let change = accumulated - total_needed;
    if change > 0 {
        outputs.push(TXOutput::new(&from, change));
    }

    Ok(Transaction::new(
        inputs,
        outputs,
        fee,
        message.map(str::to_string),
    ))
}

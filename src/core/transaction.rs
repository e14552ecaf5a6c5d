// This file implements the transaction record - the unit of value transfer in my ledger
// I follow the UTXO model: every input consumes one earlier output, every output
// creates a new claim that a later input can consume
//
// A transaction with no inputs is a coinbase (newly minted reward). I don't use a
// separate type for it; everything branches on `is_coinbase()`

use crate::error::{BlockchainError, Result};
use crate::utils::{sha256_digest, SignatureVerifier};
use crate::wallet::address_from_public_key;
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

// This is an input - it points at exactly one earlier output and proves the right to spend it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TXInput {
    transaction_id: String, // Hex hash of the transaction that created the output
    output_index: u32,      // Position of the output in that transaction
    #[serde(with = "hex")]
    public_key: Vec<u8>, // Uncompressed P-256 point of the spender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>, // Hex DER signature, absent until the wallet signs
}

impl TXInput {
    // When I create a new input it is unsigned; the wallet fills the signature in later
    pub fn new(transaction_id: &str, output_index: u32, public_key: &[u8]) -> TXInput {
        TXInput {
            transaction_id: transaction_id.to_string(),
            output_index,
            public_key: public_key.to_vec(),
            signature: None,
        }
    }

    pub fn get_transaction_id(&self) -> &str {
        self.transaction_id.as_str()
    }

    pub fn get_output_index(&self) -> u32 {
        self.output_index
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub(crate) fn set_signature(&mut self, signature: &[u8]) {
        self.signature = Some(HEXLOWER.encode(signature));
    }

    /// The address that owns whatever this input spends, derived from its key.
    pub fn spender_address(&self) -> String {
        address_from_public_key(&self.public_key)
    }

    /// Digest of `transaction_id ‖ output_index`.
    ///
    /// This is both the input's contribution to the transaction hash and the
    /// message its signature covers. A signature therefore authorizes spending
    /// one specific output and nothing else in the transaction.
    pub fn digest(&self) -> Vec<u8> {
        let data = format!("{}{}", self.transaction_id, self.output_index);
        sha256_digest(data.as_bytes())
    }

    fn verify_signature(&self, verifier: &dyn SignatureVerifier) -> Result<()> {
        let encoded = self.signature.as_deref().ok_or_else(|| {
            BlockchainError::Signature(format!(
                "Input {}:{} is not signed",
                self.transaction_id, self.output_index
            ))
        })?;

        let signature = HEXLOWER.decode(encoded.as_bytes()).map_err(|e| {
            BlockchainError::Signature(format!(
                "Input {}:{} has an undecodable signature: {e}",
                self.transaction_id, self.output_index
            ))
        })?;

        if !verifier.verify(&self.public_key, &self.digest(), &signature) {
            return Err(BlockchainError::Signature(format!(
                "Signature for input {}:{} does not verify",
                self.transaction_id, self.output_index
            )));
        }
        Ok(())
    }
}

// An output is a claim payable to an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TXOutput {
    address: String,
    amount: u64,
}

impl TXOutput {
    pub fn new(address: &str, amount: u64) -> TXOutput {
        TXOutput {
            address: address.to_string(),
            amount,
        }
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn digest(&self) -> Vec<u8> {
        let data = format!("{}{}", self.address, self.amount);
        sha256_digest(data.as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    inputs: Vec<TXInput>,
    outputs: Vec<TXOutput>,
    fee: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Transaction {
    pub fn new(
        inputs: Vec<TXInput>,
        outputs: Vec<TXOutput>,
        fee: u64,
        message: Option<String>,
    ) -> Transaction {
        Transaction {
            inputs,
            outputs,
            fee,
            message,
        }
    }

    // When I mint new value (mining reward) there is nothing to spend and nothing to sign
    pub fn new_coinbase(to: &str, amount: u64, message: &str) -> Transaction {
        Transaction {
            inputs: vec![],
            outputs: vec![TXOutput::new(to, amount)],
            fee: 0,
            message: Some(message.to_string()),
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn get_inputs(&self) -> &[TXInput] {
        self.inputs.as_slice()
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut [TXInput] {
        self.inputs.as_mut_slice()
    }

    pub fn get_outputs(&self) -> &[TXOutput] {
        self.outputs.as_slice()
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    pub fn get_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Content hash: input digests, then output digests, then `message ‖ fee`,
    /// hashed once more. Signatures are not part of it.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut data = Vec::new();
        for input in &self.inputs {
            data.extend(input.digest());
        }
        for output in &self.outputs {
            data.extend(output.digest());
        }
        data.extend(self.message.as_deref().unwrap_or_default().as_bytes());
        data.extend(self.fee.to_string().as_bytes());
        sha256_digest(&data)
    }

    /// Hex form of [`Transaction::hash_bytes`]; the id its outputs are known by.
    pub fn hash(&self) -> String {
        HEXLOWER.encode(&self.hash_bytes())
    }

    /// The address paying, taken from the first input's key. `None` for a coinbase.
    pub fn sender_address(&self) -> Option<String> {
        self.inputs.first().map(TXInput::spender_address)
    }

    /// The primary recipient: the first output.
    pub fn recipient(&self) -> Option<&TXOutput> {
        self.outputs.first()
    }

    pub fn total_output(&self) -> Result<u64> {
        let mut total = 0u64;
        for output in &self.outputs {
            total = total
                .checked_add(output.get_amount())
                .ok_or_else(|| BlockchainError::Transaction("Output value overflow".to_string()))?;
        }
        Ok(total)
    }

    /// Check every input signature. A coinbase has none and passes vacuously.
    pub fn verify_signatures(&self, verifier: &dyn SignatureVerifier) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }
        for input in &self.inputs {
            input.verify_signature(verifier)?;
        }
        Ok(())
    }

    pub fn has_valid_signatures(&self, verifier: &dyn SignatureVerifier) -> bool {
        self.verify_signatures(verifier).is_ok()
    }
}

use crate::core::Block;
use crate::error::{BlockchainError, Result};
use crate::utils::{sha256_digest, to_json};
use data_encoding::HEXLOWER;

/// A SHA-256 hex digest has 64 characters, so no more zeros can ever be demanded.
pub const MAX_DIFFICULTY: u32 = 64;

/// Nonce search over a fixed block body.
///
/// The preimage is `timestamp ‖ transactions ‖ prev_block_hash ‖ nonce`. Only
/// the nonce changes between attempts, so everything before it is rendered once.
pub struct ProofOfWork {
    body: String,
    target: String,
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new_proof_of_work(block: &Block, difficulty: u32) -> Result<ProofOfWork> {
        if difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::InvalidBlock(format!(
                "Difficulty {difficulty} exceeds the {MAX_DIFFICULTY} hex digits of a hash"
            )));
        }

        let mut body = block.get_timestamp().to_string();
        for tx in block.get_transactions() {
            body.push_str(&to_json(tx)?);
            body.push('\n');
        }
        body.push_str(block.get_prev_block_hash());

        Ok(ProofOfWork {
            body,
            target: "0".repeat(difficulty as usize),
            difficulty,
        })
    }

    fn prepare_data(&self, nonce: u64) -> Vec<u8> {
        let mut data_bytes = Vec::with_capacity(self.body.len() + 20);
        data_bytes.extend(self.body.as_bytes());
        data_bytes.extend(nonce.to_string().as_bytes());
        data_bytes
    }

    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        HEXLOWER.encode(&sha256_digest(&self.prepare_data(nonce)))
    }

    pub fn meets_target(&self, hash: &str) -> bool {
        hash.starts_with(self.target.as_str())
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Try nonces from zero upward until the hash has the required zero prefix.
    pub fn run(&self) -> (u64, String) {
        let mut nonce: u64 = 0;
        loop {
            let hash = self.hash_with_nonce(nonce);
            if self.meets_target(&hash) {
                return (nonce, hash);
            }
            nonce = nonce.wrapping_add(1);
        }
    }

    /// Recompute a block's hash from its fields; it must carry the zero prefix
    /// for the block's difficulty and equal the stored hash.
    pub fn validate(block: &Block) -> bool {
        let pow = match ProofOfWork::new_proof_of_work(block, block.get_difficulty()) {
            Ok(pow) => pow,
            Err(e) => {
                log::debug!("Cannot rebuild proof-of-work for block: {e}");
                return false;
            }
        };

        if !pow.meets_target(block.get_hash()) {
            return false;
        }
        pow.hash_with_nonce(block.get_nonce()) == block.get_hash()
    }
}

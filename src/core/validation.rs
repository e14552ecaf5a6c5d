// Consensus rules shared by live admission, mining and full-chain replay
//
// Everything here is a pure function of its arguments. Replay builds its own
// UTXO set from nothing and never looks at the live one, so a chain is judged
// only by what its blocks contain.

use crate::core::{Block, ConsensusParams, DifficultyAdjustment, Transaction};
use crate::error::{BlockchainError, Result};
use crate::storage::UTXOSet;
use crate::utils::SignatureVerifier;
use log::debug;
use std::collections::HashSet;

/// Check that a non-coinbase transaction may spend what it claims against
/// `utxo_set`, and return the total value of its inputs.
///
/// Signatures come first, then each input must exist and belong to the key
/// that signed it, and finally inputs must equal outputs plus fee exactly.
pub fn validate_spend(
    tx: &Transaction,
    utxo_set: &UTXOSet,
    verifier: &dyn SignatureVerifier,
) -> Result<u64> {
    tx.verify_signatures(verifier)?;

    let sender = tx.sender_address().unwrap_or_default();
    let mut seen = HashSet::new();
    let mut input_total = 0u64;

    for input in tx.get_inputs() {
        let outpoint = (input.get_transaction_id(), input.get_output_index());
        if !seen.insert(outpoint) {
            return Err(BlockchainError::Transaction(format!(
                "Output {}:{} is spent twice by the same transaction",
                input.get_transaction_id(),
                input.get_output_index()
            )));
        }

        let utxo = utxo_set
            .get(input.get_transaction_id(), input.get_output_index())
            .ok_or_else(|| BlockchainError::MissingUtxo {
                transaction_id: input.get_transaction_id().to_string(),
                output_index: input.get_output_index(),
            })?;

        // Every input must be spent by the same sender that owns the output
        let spender = input.spender_address();
        if utxo.address != spender || spender != sender {
            return Err(BlockchainError::OwnershipMismatch {
                transaction_id: utxo.transaction_id.clone(),
                output_index: utxo.output_index,
                owner: utxo.address.clone(),
                spender,
            });
        }

        input_total = input_total
            .checked_add(utxo.amount)
            .ok_or_else(|| BlockchainError::Transaction("Input value overflow".to_string()))?;
    }

    let required = tx
        .total_output()?
        .checked_add(tx.get_fee())
        .ok_or_else(|| BlockchainError::Transaction("Output value overflow".to_string()))?;

    if input_total < required {
        return Err(BlockchainError::InsufficientFunds {
            required,
            available: input_total,
        });
    }
    if input_total > required {
        return Err(BlockchainError::Transaction(format!(
            "Inputs ({input_total}) exceed outputs plus fee ({required})"
        )));
    }

    Ok(input_total)
}

/// Rules a transaction must satisfy wherever it appears in a block.
///
/// A coinbase only needs its shape (exactly one output). Anything else must
/// pay at least the minimum fee and pass [`validate_spend`].
pub fn validate_transaction(
    tx: &Transaction,
    utxo_set: &UTXOSet,
    params: &ConsensusParams,
    verifier: &dyn SignatureVerifier,
) -> Result<()> {
    if tx.is_coinbase() {
        return validate_coinbase_shape(tx);
    }

    if tx.get_fee() < params.min_fee {
        return Err(BlockchainError::Transaction(format!(
            "Fee {} is below the minimum of {}",
            tx.get_fee(),
            params.min_fee
        )));
    }

    validate_spend(tx, utxo_set, verifier).map(|_| ())
}

pub fn validate_coinbase_shape(tx: &Transaction) -> Result<()> {
    if tx.get_outputs().len() != 1 {
        return Err(BlockchainError::Transaction(format!(
            "Coinbase transaction must have exactly one output, found {}",
            tx.get_outputs().len()
        )));
    }
    Ok(())
}

/// Replay `blocks` from an empty UTXO set and stop at the first broken rule.
///
/// For every block, in order: the stored hash must be valid, the block must
/// link to its predecessor (or to `""` if first), its difficulty must be the
/// one the retarget rule gives for the blocks before it, and its first
/// transaction must be a coinbase paying exactly the block reward plus fees.
/// Each transaction is then checked against the replay set and applied to it.
/// A transaction id may appear only once in the whole chain.
pub fn validate_chain(
    blocks: &[Block],
    params: &ConsensusParams,
    verifier: &dyn SignatureVerifier,
) -> Result<()> {
    let mut utxo_set = UTXOSet::new();
    let mut seen_ids = HashSet::new();

    for (height, block) in blocks.iter().enumerate() {
        validate_header(blocks, height, params)?;
        validate_reward(block, height, params)?;

        for (position, tx) in block.get_transactions().iter().enumerate() {
            let hash = tx.hash();
            // A repeated id would overwrite the outputs already recorded under it
            if !seen_ids.insert(hash.clone()) {
                return Err(BlockchainError::InvalidChain(format!(
                    "Transaction {hash} (#{position} in block {height}) appears earlier in the chain"
                )));
            }
            validate_transaction(tx, &utxo_set, params, verifier).map_err(|e| {
                BlockchainError::InvalidChain(format!(
                    "Transaction {hash} (#{position} in block {height}) is invalid: {e}"
                ))
            })?;
            utxo_set.apply_transaction(tx);
        }
    }

    debug!(
        "Replayed {} blocks, {} unspent outputs",
        blocks.len(),
        utxo_set.len()
    );
    Ok(())
}

fn validate_header(blocks: &[Block], height: usize, params: &ConsensusParams) -> Result<()> {
    let block = &blocks[height];

    if !block.is_hash_valid() {
        return Err(BlockchainError::InvalidBlock(format!(
            "Block {height} has an invalid hash {}",
            block.get_hash()
        )));
    }

    let expected_prev = match height {
        0 => "",
        _ => blocks[height - 1].get_hash(),
    };
    if block.get_prev_block_hash() != expected_prev {
        return Err(BlockchainError::InvalidBlock(format!(
            "Block {height} links to {:?}, expected {expected_prev:?}",
            block.get_prev_block_hash()
        )));
    }

    let expected_difficulty = DifficultyAdjustment::calculate_next_difficulty(&blocks[..height], params);
    if block.get_difficulty() != expected_difficulty {
        return Err(BlockchainError::InvalidBlock(format!(
            "Block {height} claims difficulty {}, expected {expected_difficulty}",
            block.get_difficulty()
        )));
    }
    Ok(())
}

fn validate_reward(block: &Block, height: usize, params: &ConsensusParams) -> Result<()> {
    let coinbase = block
        .get_transactions()
        .first()
        .filter(|tx| tx.is_coinbase())
        .ok_or_else(|| {
            BlockchainError::InvalidBlock(format!("Block {height} does not start with a coinbase"))
        })?;

    let expected = params.block_reward.saturating_add(block.total_fees());
    let paid = coinbase.total_output()?;
    if paid != expected {
        return Err(BlockchainError::InvalidBlock(format!(
            "Block {height} pays a reward of {paid}, expected {expected}"
        )));
    }
    Ok(())
}

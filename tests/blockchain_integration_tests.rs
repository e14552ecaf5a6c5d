//! Ledger integration tests
//!
//! End-to-end runs through the public API with real ECDSA wallets: paying,
//! mining, rejecting double spends, and surviving (or refusing) a reload.

use proptest::prelude::*;
use std::collections::HashSet;
use std::fs;
use tempfile::tempdir;
use utxo_ledger::core::ConsensusParams;
use utxo_ledger::storage::{LedgerSnapshot, LEDGER_FILE};
use utxo_ledger::{Blockchain, BlockchainError, UTXOSet, Wallet, Wallets};

// A zero target means no run of blocks is ever "too fast", so retargeting
// can only hold or lower difficulty and long sequences stay cheap to mine
fn cheap_params() -> ConsensusParams {
    ConsensusParams {
        initial_difficulty: 1,
        target_block_time_ms: 0,
        min_fee: 1,
        block_reward: 100,
        ..ConsensusParams::default()
    }
}

fn pay(chain: &mut Blockchain, from: &Wallet, to: &Wallet, amount: u64, fee: u64) -> utxo_ledger::Result<()> {
    let mut tx = from.create_transaction(&to.get_address(), amount, fee, chain.utxo_set(), None)?;
    from.sign_transaction(&mut tx)?;
    chain.add_transaction(tx)
}

#[test]
fn test_genesis_at_difficulty_two() {
    let alice = Wallet::new().unwrap();
    let params = ConsensusParams {
        initial_difficulty: 2,
        ..cheap_params()
    };
    let chain = Blockchain::new(&alice.get_address(), params).unwrap();
    let genesis = &chain.blocks()[0];
    assert_eq!(genesis.get_prev_block_hash(), "");
    assert!(genesis.get_hash().starts_with("00"));
    assert!(genesis.is_hash_valid());
    assert!(chain.is_blockchain_valid());
}

#[test]
fn test_payment_with_change_and_miner_reward() {
    let alice = Wallet::new().unwrap();
    let bob = Wallet::new().unwrap();
    let miner = Wallet::new().unwrap();

    let mut chain = Blockchain::new(&alice.get_address(), cheap_params()).unwrap();
    assert_eq!(chain.balance_of(&alice.get_address()), 100);

    pay(&mut chain, &alice, &bob, 40, 1).unwrap();
    let block = chain.mine_block(&miner.get_address()).unwrap().unwrap();

    assert_eq!(block.get_transactions().len(), 2);
    assert_eq!(chain.balance_of(&alice.get_address()), 59);
    assert_eq!(chain.balance_of(&bob.get_address()), 40);
    assert_eq!(chain.balance_of(&miner.get_address()), 101);
    assert!(chain.mempool().is_empty());
    assert!(chain.is_blockchain_valid());
}

#[test]
fn test_replayed_spend_is_rejected() {
    let alice = Wallet::new().unwrap();
    let bob = Wallet::new().unwrap();
    let mut chain = Blockchain::new(&alice.get_address(), cheap_params()).unwrap();

    let mut tx = alice
        .create_transaction(&bob.get_address(), 40, 1, chain.utxo_set(), None)
        .unwrap();
    alice.sign_transaction(&mut tx).unwrap();
    chain.add_transaction(tx.clone()).unwrap();
    chain.mine_block(&bob.get_address()).unwrap();

    let result = chain.add_transaction(tx);
    assert!(matches!(result, Err(BlockchainError::MissingUtxo { .. })));
    assert!(chain.mempool().is_empty());
}

#[test]
fn test_cannot_spend_someone_elses_output() {
    let alice = Wallet::new().unwrap();
    let mallory = Wallet::new().unwrap();
    let mut chain = Blockchain::new(&alice.get_address(), cheap_params()).unwrap();

    // Mallory builds a spend of Alice's coins under her own key
    let utxo = chain.utxo_set().find_by_address(&alice.get_address())[0].clone();
    let mut tx = utxo_ledger::Transaction::new(
        vec![utxo_ledger::TXInput::new(
            &utxo.transaction_id,
            utxo.output_index,
            mallory.get_public_key(),
        )],
        vec![utxo_ledger::TXOutput::new(&alice.get_address(), 99)],
        1,
        None,
    );
    mallory.sign_transaction(&mut tx).unwrap();
    assert!(matches!(
        chain.add_transaction(tx),
        Err(BlockchainError::OwnershipMismatch { .. })
    ));
}

#[test]
fn test_ledger_survives_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(LEDGER_FILE);
    let alice = Wallet::new().unwrap();
    let bob = Wallet::new().unwrap();

    let mut chain = Blockchain::new(&alice.get_address(), cheap_params()).unwrap();
    pay(&mut chain, &alice, &bob, 25, 2).unwrap();
    chain.mine_block(&alice.get_address()).unwrap();
    pay(&mut chain, &bob, &alice, 5, 1).unwrap();
    chain.save_to_file(&path).unwrap();

    let loaded = Blockchain::load_from_file(&path, cheap_params()).unwrap();
    assert_eq!(loaded.height(), 2);
    assert_eq!(loaded.mempool().len(), 1);
    assert!(loaded.utxo_set().same_entries(chain.utxo_set()));
    assert_eq!(loaded.balance_of(&bob.get_address()), 25);
}

#[test]
fn test_hand_edited_ledger_is_refused() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(LEDGER_FILE);
    let alice = Wallet::new().unwrap();
    let bob = Wallet::new().unwrap();

    let mut chain = Blockchain::new(&alice.get_address(), cheap_params()).unwrap();
    pay(&mut chain, &alice, &bob, 40, 1).unwrap();
    chain.mine_block(&alice.get_address()).unwrap();
    chain.save_to_file(&path).unwrap();

    // Bob's 40 becomes 4000 in the file
    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    value["blocks"][1]["transactions"][1]["outputs"][0]["amount"] = serde_json::json!(4_000);
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();

    let result = Blockchain::load_from_file(&path, cheap_params());
    assert!(matches!(result, Err(BlockchainError::InvalidChain(_))));
}

#[test]
fn test_snapshot_shape() {
    let alice = Wallet::new().unwrap();
    let chain = Blockchain::new(&alice.get_address(), cheap_params()).unwrap();
    let snapshot = LedgerSnapshot::of(&chain);
    assert_eq!(snapshot.blocks.len(), 1);
    assert!(snapshot.mempool.is_empty());
}

#[test]
fn test_wallet_store_feeds_the_ledger() {
    let dir = tempdir().unwrap();
    let mut wallets = Wallets::load(dir.path().join("wallet.dat")).unwrap();
    let alice = wallets.create_wallet().unwrap();
    let bob = wallets.create_wallet().unwrap();

    let wallets = Wallets::load(dir.path().join("wallet.dat")).unwrap();
    let alice_wallet = wallets.get_wallet(&alice).unwrap();
    let bob_wallet = wallets.get_wallet(&bob).unwrap();

    let mut chain = Blockchain::new(&alice, cheap_params()).unwrap();
    pay(&mut chain, alice_wallet, bob_wallet, 10, 1).unwrap();
    chain.mine_block(&bob).unwrap();
    assert_eq!(chain.balance_of(&bob), 10 + 101);
    assert_eq!(chain.balance_of(&alice), 89);
}

#[derive(Debug, Clone)]
enum Op {
    Send {
        from: usize,
        to: usize,
        amount: u64,
        fee: u64,
    },
    Mine {
        miner: usize,
    },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..3usize, 0..3usize, 1..80u64, 1..4u64)
            .prop_map(|(from, to, amount, fee)| Op::Send { from, to, amount, fee }),
        1 => (0..3usize).prop_map(|miner| Op::Mine { miner }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_replayed_utxo_set_matches_live(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let wallets: Vec<Wallet> = (0..3).map(|_| Wallet::new().unwrap()).collect();
        let mut chain = Blockchain::new(&wallets[0].get_address(), cheap_params()).unwrap();

        for op in ops {
            match op {
                Op::Send { from, to, amount, fee } => {
                    // Rejections are part of the sequence, not failures
                    let _ = pay(&mut chain, &wallets[from], &wallets[to], amount, fee);
                }
                Op::Mine { miner } => {
                    chain.mine_block(&wallets[miner].get_address()).unwrap();
                }
            }

            let hashes: HashSet<String> =
                chain.mempool().transactions().iter().map(|tx| tx.hash()).collect();
            prop_assert_eq!(hashes.len(), chain.mempool().len());
        }
        chain.mine_block(&wallets[0].get_address()).unwrap();

        let replayed = UTXOSet::rebuild(chain.blocks());
        prop_assert!(replayed.same_entries(chain.utxo_set()));
        prop_assert!(chain.is_blockchain_valid());
        prop_assert!(chain.mempool().is_empty());

        let total: u64 = chain.utxo_set().iter().map(|u| u.amount).sum();
        prop_assert_eq!(total, 100 * chain.height() as u64);
    }
}

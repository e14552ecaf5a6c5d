// This is the entry point for the ledger CLI
// Every command loads the ledger file, does one thing, and saves it back if it changed
use clap::Parser;
use log::error;
use std::process;
use std::thread;
use std::time::Duration;
use utxo_ledger::core::monetary::conversions::units_to_coins;
use utxo_ledger::{
    validate_address, Blockchain, BlockchainError, Command, Opt, Wallets, GLOBAL_CONFIG,
};

fn main() {
    // Info by default, RUST_LOG still wins when it is set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        match e.downcast_ref::<BlockchainError>() {
            Some(err) if err.is_rejection() => error!("Transaction rejected: {err}"),
            _ => error!("Error: {e}"),
        }
        process::exit(1);
    }
}

fn open_ledger() -> Result<Blockchain, BlockchainError> {
    let path = GLOBAL_CONFIG.get_ledger_file();
    if !path.exists() {
        return Err(BlockchainError::Config(format!(
            "No ledger at {}. Run 'createblockchain' first.",
            path.display()
        )));
    }
    Blockchain::load_from_file(&path, GLOBAL_CONFIG.get_consensus_params())
}

fn save_ledger(blockchain: &Blockchain) -> Result<(), BlockchainError> {
    blockchain.save_to_file(GLOBAL_CONFIG.get_ledger_file())
}

fn check_address(address: &str) -> Result<(), BlockchainError> {
    if !validate_address(address) {
        return Err(BlockchainError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

fn resolve_miner(address: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    let miner = address
        .or_else(|| GLOBAL_CONFIG.get_mining_addr())
        .ok_or("No reward address given and MINING_ADDRESS is not set")?;
    check_address(&miner)?;
    Ok(miner)
}

fn mine_and_report(blockchain: &mut Blockchain, miner: &str) -> Result<(), BlockchainError> {
    match blockchain.mine_block(miner)? {
        Some(block) => println!(
            "Mined block {} with {} transactions: {}",
            blockchain.height() - 1,
            block.get_transactions().len(),
            block.get_hash()
        ),
        None => println!("Nothing to mine"),
    }
    Ok(())
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Createwallet => {
            let mut wallets = Wallets::load(GLOBAL_CONFIG.get_wallet_file())?;
            let address = wallets.create_wallet()?;
            println!("Your new address: {address}")
        }
        Command::ListAddresses => {
            let wallets = Wallets::load(GLOBAL_CONFIG.get_wallet_file())?;
            for address in wallets.get_addresses() {
                println!("{address}")
            }
        }
        Command::Createblockchain { address } => {
            check_address(&address)?;
            let path = GLOBAL_CONFIG.get_ledger_file();
            if path.exists() {
                return Err(format!("Ledger already exists at {}", path.display()).into());
            }
            let blockchain = Blockchain::new(&address, GLOBAL_CONFIG.get_consensus_params())?;
            save_ledger(&blockchain)?;
            println!("Done! Genesis block: {}", blockchain.tip_hash());
        }
        Command::Send {
            from,
            to,
            amount,
            fee,
            message,
            mine,
        } => {
            check_address(&from)?;
            check_address(&to)?;

            let wallets = Wallets::load(GLOBAL_CONFIG.get_wallet_file())?;
            let wallet = wallets
                .get_wallet(&from)
                .ok_or_else(|| BlockchainError::Wallet(format!("No local wallet for {from}")))?;

            let mut blockchain = open_ledger()?;
            let fee = fee.unwrap_or(blockchain.get_params().min_fee);
            let mut tx =
                wallet.create_transaction(&to, amount, fee, blockchain.utxo_set(), message.as_deref())?;
            wallet.sign_transaction(&mut tx)?;
            let txid = tx.hash();
            blockchain.add_transaction(tx)?;
            println!("Submitted transaction {txid}");

            if mine {
                let miner = GLOBAL_CONFIG.get_mining_addr().unwrap_or(from);
                mine_and_report(&mut blockchain, &miner)?;
            }
            save_ledger(&blockchain)?;
        }
        Command::Mine { address } => {
            let miner = resolve_miner(address)?;
            let mut blockchain = open_ledger()?;
            mine_and_report(&mut blockchain, &miner)?;
            save_ledger(&blockchain)?;
        }
        Command::Run { address, delay } => {
            let miner = resolve_miner(address)?;
            let mut blockchain = open_ledger()?;
            let pending = blockchain.mempool().len();
            if pending == 0 {
                println!("No pending transactions to mine");
                return Ok(());
            }
            println!("Mining {pending} pending transactions for {miner}");

            // One block per round, saved as it lands, until the pool is drained
            let mut mined = 0usize;
            while let Some(block) = blockchain.mine_block(&miner)? {
                mined += 1;
                println!(
                    "Mined block {} with {} transactions, {} still pending",
                    blockchain.height() - 1,
                    block.get_transactions().len(),
                    blockchain.mempool().len()
                );
                save_ledger(&blockchain)?;
                if delay > 0 && !blockchain.mempool().is_empty() {
                    thread::sleep(Duration::from_secs(delay));
                }
            }
            // Evictions can empty the pool without a block being mined
            save_ledger(&blockchain)?;
            println!("Done! Mined {mined} blocks");
        }
        Command::GetBalance { address } => {
            check_address(&address)?;
            let blockchain = open_ledger()?;
            let balance = blockchain.balance_of(&address);
            println!(
                "Balance of {address}: {balance} ({:.6} coins)",
                units_to_coins(balance)
            );
        }
        Command::Printchain => {
            let blockchain = open_ledger()?;
            for (height, block) in blockchain.blocks().iter().enumerate() {
                println!("Block {height}");
                println!("Pre block hash: {}", block.get_prev_block_hash());
                println!("Cur block hash: {}", block.get_hash());
                println!("Timestamp: {}", block.get_timestamp());
                println!("Nonce: {}, difficulty: {}", block.get_nonce(), block.get_difficulty());

                for tx in block.get_transactions() {
                    println!("- Transaction {} (fee: {})", tx.hash(), tx.get_fee());
                    if let Some(message) = tx.get_message() {
                        println!("-- Message: {message}");
                    }
                    for input in tx.get_inputs() {
                        println!(
                            "-- Input txid = {}, index = {}, from = {}",
                            input.get_transaction_id(),
                            input.get_output_index(),
                            input.spender_address()
                        )
                    }
                    for output in tx.get_outputs() {
                        println!(
                            "-- Output amount = {}, to = {}",
                            output.get_amount(),
                            output.get_address()
                        )
                    }
                }
                println!()
            }
        }
        Command::Mempool => {
            let blockchain = open_ledger()?;
            if blockchain.mempool().is_empty() {
                println!("Mempool is empty");
            }
            for tx in blockchain.mempool().transactions() {
                let recipient = tx
                    .recipient()
                    .map(|out| format!("{} to {}", out.get_amount(), out.get_address()))
                    .unwrap_or_default();
                println!("{} fee={} {recipient}", tx.hash(), tx.get_fee());
            }
        }
        Command::Validate => {
            let blockchain = open_ledger()?;
            match blockchain.validate() {
                Ok(()) => println!("Chain of {} blocks is valid", blockchain.height()),
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

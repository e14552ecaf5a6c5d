use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "utxo-ledger", about = "A single-node UTXO ledger with proof-of-work")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(name = "createblockchain", about = "Create a new ledger")]
    Createblockchain {
        #[arg(help = "The address to send the genesis block reward to")]
        address: String,
    },
    #[command(name = "send", about = "Submit a payment to the mempool")]
    Send {
        #[arg(help = "Source wallet address")]
        from: String,
        #[arg(help = "Destination wallet address")]
        to: String,
        #[arg(help = "Amount to send (in units)")]
        amount: u64,
        #[arg(long, help = "Fee in units (defaults to the minimum fee)")]
        fee: Option<u64>,
        #[arg(long, help = "Free-form message stored with the transaction")]
        message: Option<String>,
        #[arg(long, help = "Mine a block right after submitting")]
        mine: bool,
    },
    #[command(name = "mine", about = "Mine pending transactions into a block")]
    Mine {
        #[arg(help = "Reward address (defaults to MINING_ADDRESS)")]
        address: Option<String>,
    },
    #[command(name = "run", about = "Keep mining blocks until the mempool is empty")]
    Run {
        #[arg(help = "Reward address (defaults to MINING_ADDRESS)")]
        address: Option<String>,
        #[arg(long, default_value_t = 0, help = "Seconds to wait between blocks")]
        delay: u64,
    },
    #[command(
        name = "getbalance",
        about = "Get the balance of the target address"
    )]
    GetBalance {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(name = "printchain", about = "Print all blocks in the ledger")]
    Printchain,
    #[command(name = "mempool", about = "List pending transactions")]
    Mempool,
    #[command(name = "validate", about = "Replay the whole chain and report validity")]
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_flags() {
        let opt = Opt::try_parse_from([
            "utxo-ledger",
            "send",
            "alice",
            "bob",
            "40",
            "--fee",
            "1000",
            "--message",
            "rent",
            "--mine",
        ])
        .unwrap();
        assert_eq!(
            opt.command,
            Command::Send {
                from: "alice".to_string(),
                to: "bob".to_string(),
                amount: 40,
                fee: Some(1000),
                message: Some("rent".to_string()),
                mine: true,
            }
        );
    }

    #[test]
    fn test_mine_address_is_optional() {
        let opt = Opt::try_parse_from(["utxo-ledger", "mine"]).unwrap();
        assert_eq!(opt.command, Command::Mine { address: None });
    }

    #[test]
    fn test_run_delay() {
        let opt = Opt::try_parse_from(["utxo-ledger", "run", "miner", "--delay", "2"]).unwrap();
        assert_eq!(
            opt.command,
            Command::Run {
                address: Some("miner".to_string()),
                delay: 2,
            }
        );

        let opt = Opt::try_parse_from(["utxo-ledger", "run"]).unwrap();
        assert_eq!(
            opt.command,
            Command::Run {
                address: None,
                delay: 0,
            }
        );
    }

    #[test]
    fn test_negative_amount_is_refused() {
        assert!(Opt::try_parse_from(["utxo-ledger", "send", "a", "b", "-5"]).is_err());
    }
}

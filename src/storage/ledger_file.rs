use crate::core::{Block, Blockchain, ConsensusParams};
use crate::error::Result;
use crate::storage::MemoryPool;
use crate::utils::{from_json, to_json_pretty, SignatureVerifier};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const LEDGER_FILE: &str = "ledger.json";

/// What goes on disk: the blocks and the pending transactions. The UTXO set
/// is left out on purpose; it is rebuilt from the blocks on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub blocks: Vec<Block>,
    pub mempool: MemoryPool,
}

impl LedgerSnapshot {
    pub fn of(blockchain: &Blockchain) -> LedgerSnapshot {
        LedgerSnapshot {
            blocks: blockchain.blocks().to_vec(),
            mempool: blockchain.mempool().clone(),
        }
    }
}

pub fn save(blockchain: &Blockchain, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = to_json_pretty(&LedgerSnapshot::of(blockchain))?;
    fs::write(path, json)?;
    info!(
        "Saved ledger with {} blocks to {}",
        blockchain.height(),
        path.display()
    );
    Ok(())
}

/// Read a snapshot and rebuild a ledger from it.
///
/// Unreadable or malformed files surface as `Io` / `Serialization` errors; a
/// well-formed file whose chain fails replay is `InvalidChain`.
pub fn load(
    path: impl AsRef<Path>,
    params: ConsensusParams,
    verifier: Arc<dyn SignatureVerifier>,
) -> Result<Blockchain> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let snapshot: LedgerSnapshot = from_json(&text)?;
    Blockchain::from_parts(snapshot.blocks, snapshot.mempool, params, verifier)
}

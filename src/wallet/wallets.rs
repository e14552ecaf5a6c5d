use crate::error::{BlockchainError, Result};
use crate::utils::{deserialize, serialize};
use crate::wallet::Wallet;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const WALLET_FILE: &str = "wallet.dat";

/// Key store: every wallet this process created, keyed by address and kept
/// in a bincode file next to the ledger.
pub struct Wallets {
    wallets: HashMap<String, Wallet>,
    path: PathBuf,
}

impl Wallets {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Wallets> {
        let path = path.as_ref().to_path_buf();
        let mut wallets = Wallets {
            wallets: HashMap::new(),
            path,
        };

        if wallets.path.exists() {
            let bytes = fs::read(&wallets.path)?;
            wallets.wallets = deserialize(&bytes).map_err(|e| {
                BlockchainError::Wallet(format!(
                    "Could not read wallets from {}: {e}",
                    wallets.path.display()
                ))
            })?;
        }
        Ok(wallets)
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        self.save()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.wallets.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    pub fn save(&self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        let wallets_bytes = serialize(&self.wallets)?;
        writer.write_all(wallets_bytes.as_slice())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let wallets = Wallets::load(dir.path().join(WALLET_FILE)).unwrap();
        assert!(wallets.get_addresses().is_empty());
    }

    #[test]
    fn test_created_wallets_survive_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(WALLET_FILE);

        let mut wallets = Wallets::load(&path).unwrap();
        let first = wallets.create_wallet().unwrap();
        let second = wallets.create_wallet().unwrap();

        let reloaded = Wallets::load(&path).unwrap();
        let mut expected = vec![first.clone(), second];
        expected.sort();
        assert_eq!(reloaded.get_addresses(), expected);

        let wallet = reloaded.get_wallet(&first).unwrap();
        assert_eq!(wallet.get_address(), first);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(WALLET_FILE);
        fs::write(&path, [0xFF, 0xFF, 0xFF]).unwrap();
        assert!(matches!(
            Wallets::load(&path),
            Err(BlockchainError::Wallet(_))
        ));
    }
}

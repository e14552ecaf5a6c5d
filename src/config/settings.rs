use crate::core::ConsensusParams;
use crate::error::{BlockchainError, Result};
use crate::storage::LEDGER_FILE;
use crate::wallet::WALLET_FILE;
use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

pub const CONFIG_FILE: &str = "utxo-ledger.toml";

const CONFIG_PATH_KEY: &str = "LEDGER_CONFIG";
const LEDGER_FILE_KEY: &str = "LEDGER_FILE";
const WALLET_FILE_KEY: &str = "WALLET_FILE";
const MINING_ADDRESS_KEY: &str = "MINING_ADDRESS";

/// Everything the binary can be configured with.
///
/// ```toml
/// ledger_file = "data/ledger.json"
/// mining_address = "..."
///
/// [consensus]
/// initial_difficulty = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ledger_file: PathBuf,
    pub wallet_file: PathBuf,
    pub mining_address: Option<String>,
    pub consensus: ConsensusParams,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ledger_file: PathBuf::from(LEDGER_FILE),
            wallet_file: PathBuf::from(WALLET_FILE),
            mining_address: None,
            consensus: ConsensusParams::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Settings> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Settings> {
        let text = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    // Environment wins over the file. I pass the lookup in so tests don't
    // have to touch the real process environment
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(LEDGER_FILE_KEY) {
            self.ledger_file = PathBuf::from(path);
        }
        if let Some(path) = lookup(WALLET_FILE_KEY) {
            self.wallet_file = PathBuf::from(path);
        }
        if let Some(addr) = lookup(MINING_ADDRESS_KEY) {
            self.mining_address = Some(addr);
        }
    }
}

pub struct Config {
    inner: RwLock<Settings>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    // A broken config file shouldn't take the whole process down, so I fall
    // back to defaults and say so
    pub fn new() -> Config {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring configuration: {e}");
                let mut settings = Settings::default();
                settings.apply_overrides(|key| env::var(key).ok());
                Config::from_settings(settings)
            }
        }
    }

    /// Defaults, then the TOML file (`LEDGER_CONFIG` or `utxo-ledger.toml`
    /// if present), then environment overrides.
    pub fn load() -> Result<Config> {
        let explicit = env::var(CONFIG_PATH_KEY).ok().map(PathBuf::from);
        let mut settings = match explicit {
            Some(path) => Settings::from_file(&path)?,
            None if Path::new(CONFIG_FILE).exists() => Settings::from_file(Path::new(CONFIG_FILE))?,
            None => Settings::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok());
        debug!("Loaded configuration: {settings:?}");
        Ok(Config::from_settings(settings))
    }

    pub fn from_settings(settings: Settings) -> Config {
        Config {
            inner: RwLock::new(settings),
        }
    }

    pub fn get_ledger_file(&self) -> PathBuf {
        self.read().ledger_file.clone()
    }

    pub fn get_wallet_file(&self) -> PathBuf {
        self.read().wallet_file.clone()
    }

    pub fn get_consensus_params(&self) -> ConsensusParams {
        self.read().consensus
    }

    pub fn get_mining_addr(&self) -> Option<String> {
        self.read().mining_address.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Settings> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

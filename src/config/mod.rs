//! Configuration management
//!
//! File locations, the default mining address and the consensus parameters
//! the binary builds its ledger with.

pub mod settings;

pub use settings::{Config, Settings, CONFIG_FILE, GLOBAL_CONFIG};

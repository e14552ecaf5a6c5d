/// Ledger monetary system and consensus constants
///
/// ## Monetary Units
/// - **Unit**: the smallest indivisible amount stored in outputs
/// - **Coin**: 1,000,000 units
/// - **Block Reward**: 50 coins per block, plus the fees of the block's transactions
/// - **Minimum Fee**: 1,000 units (0.001 coins)
///
/// Number of units in one coin
pub const COINS_PER_UNIT: u64 = 1_000_000;

/// Base reward paid to the miner of every block (50 coins)
pub const BLOCK_REWARD: u64 = 50 * COINS_PER_UNIT;

/// Smallest fee a non-coinbase transaction may carry
pub const MIN_FEE: u64 = 1_000;

/// Most transactions selected from the mempool per block (the coinbase is extra)
pub const MAX_BLOCK_TRANSACTIONS: usize = 10;

/// Difficulty of the genesis block and of every block before the first retarget
pub const INITIAL_DIFFICULTY: u32 = 2;

/// Number of most recent blocks the retarget looks at
pub const ADJUSTMENT_INTERVAL: usize = 5;

/// Desired mean time between blocks, in milliseconds
pub const TARGET_BLOCK_TIME_MS: i64 = 1_000;

use serde::{Deserialize, Serialize};

/// The tunable rules a ledger is built with.
///
/// Every value defaults to the constant of the same name above. Tests shrink
/// the difficulty, the binary reads overrides from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusParams {
    pub initial_difficulty: u32,
    pub adjustment_interval: usize,
    pub target_block_time_ms: i64,
    pub min_fee: u64,
    pub block_reward: u64,
    pub max_block_transactions: usize,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        ConsensusParams {
            initial_difficulty: INITIAL_DIFFICULTY,
            adjustment_interval: ADJUSTMENT_INTERVAL,
            target_block_time_ms: TARGET_BLOCK_TIME_MS,
            min_fee: MIN_FEE,
            block_reward: BLOCK_REWARD,
            max_block_transactions: MAX_BLOCK_TRANSACTIONS,
        }
    }
}

/// Utility functions for monetary conversions
pub mod conversions {
    use super::*;

    /// Convert coins to units
    ///
    /// # Examples
    /// ```
    /// use utxo_ledger::core::monetary::conversions::coins_to_units;
    /// assert_eq!(coins_to_units(1.0), 1_000_000);
    /// assert_eq!(coins_to_units(0.5), 500_000);
    /// ```
    pub fn coins_to_units(coins: f64) -> u64 {
        (coins * COINS_PER_UNIT as f64).round() as u64
    }

    /// Convert units to coins
    ///
    /// # Examples
    /// ```
    /// use utxo_ledger::core::monetary::conversions::units_to_coins;
    /// assert_eq!(units_to_coins(1_000_000), 1.0);
    /// assert_eq!(units_to_coins(500_000), 0.5);
    /// ```
    pub fn units_to_coins(units: u64) -> f64 {
        units as f64 / COINS_PER_UNIT as f64
    }
}

#[cfg(test)]
mod tests {
    use super::conversions::*;
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let params = ConsensusParams::default();
        assert_eq!(params.initial_difficulty, 2);
        assert_eq!(params.adjustment_interval, 5);
        assert_eq!(params.min_fee, 1_000);
        assert_eq!(params.block_reward, 50_000_000);
        assert_eq!(params.max_block_transactions, 10);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(coins_to_units(0.0015), 1_500);
        assert_eq!(units_to_coins(BLOCK_REWARD), 50.0);
    }
}

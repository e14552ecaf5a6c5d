use crate::core::{Block, ConsensusParams};
use log::debug;

/// Lowest difficulty a retarget can produce
pub const MIN_DIFFICULTY: u32 = 1;

/// Difficulty adjustment algorithm for keeping the mean block time near target
pub struct DifficultyAdjustment;

impl DifficultyAdjustment {
    /// Difficulty for the block that will follow `blocks`.
    ///
    /// Until `adjustment_interval` blocks exist the initial difficulty applies.
    /// After that, every new block looks at the most recent window: a mean
    /// inter-block time below target raises the last difficulty by one, above
    /// target lowers it by one (never below 1), exactly on target keeps it.
    pub fn calculate_next_difficulty(blocks: &[Block], params: &ConsensusParams) -> u32 {
        let interval = params.adjustment_interval;
        if blocks.len() < interval || interval == 0 {
            return params.initial_difficulty;
        }

        let window = &blocks[blocks.len() - interval..];
        let current_difficulty = window
            .last()
            .map(Block::get_difficulty)
            .unwrap_or(params.initial_difficulty);

        // A window of one block has no inter-block time to measure
        if window.len() < 2 {
            return current_difficulty;
        }

        let actual_span = Self::calculate_time_span(window);
        let gaps = (window.len() - 1) as i64;
        let target_span = params.target_block_time_ms.saturating_mul(gaps);

        let new_difficulty = Self::adjust_difficulty(current_difficulty, actual_span, target_span);
        debug!(
            "Difficulty retarget over {} blocks: {current_difficulty} -> {new_difficulty} (mean: {}ms, target: {}ms)",
            window.len(),
            actual_span / gaps,
            params.target_block_time_ms
        );
        new_difficulty
    }

    /// Sum of consecutive timestamp gaps, i.e. last minus first.
    fn calculate_time_span(blocks: &[Block]) -> i64 {
        match (blocks.first(), blocks.last()) {
            (Some(first), Some(last)) => last.get_timestamp().saturating_sub(first.get_timestamp()),
            _ => 0,
        }
    }

    // Comparing total spans instead of means keeps the comparison exact.
    fn adjust_difficulty(current_difficulty: u32, actual_span: i64, target_span: i64) -> u32 {
        if actual_span < target_span {
            current_difficulty.saturating_add(1)
        } else if actual_span > target_span {
            current_difficulty.saturating_sub(1).max(MIN_DIFFICULTY)
        } else {
            current_difficulty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConsensusParams {
        ConsensusParams {
            initial_difficulty: 2,
            adjustment_interval: 5,
            target_block_time_ms: 1_000,
            ..ConsensusParams::default()
        }
    }

    fn chain(gap_ms: i64, count: usize, difficulty: u32) -> Vec<Block> {
        (0..count)
            .map(|i| Block::new_test_block(i as i64 * gap_ms, difficulty))
            .collect()
    }

    #[test]
    fn test_initial_difficulty_before_first_window() {
        let params = params();
        assert_eq!(DifficultyAdjustment::calculate_next_difficulty(&[], &params), 2);
        let short = chain(10, 4, 7);
        assert_eq!(
            DifficultyAdjustment::calculate_next_difficulty(&short, &params),
            2
        );
    }

    #[test]
    fn test_fast_blocks_raise_difficulty() {
        let blocks = chain(100, 5, 2);
        assert_eq!(
            DifficultyAdjustment::calculate_next_difficulty(&blocks, &params()),
            3
        );
    }

    #[test]
    fn test_slow_blocks_lower_difficulty() {
        let blocks = chain(5_000, 5, 4);
        assert_eq!(
            DifficultyAdjustment::calculate_next_difficulty(&blocks, &params()),
            3
        );
    }

    #[test]
    fn test_on_target_keeps_difficulty() {
        let blocks = chain(1_000, 5, 4);
        assert_eq!(
            DifficultyAdjustment::calculate_next_difficulty(&blocks, &params()),
            4
        );
    }

    #[test]
    fn test_floor_at_one() {
        let blocks = chain(60_000, 5, 1);
        assert_eq!(
            DifficultyAdjustment::calculate_next_difficulty(&blocks, &params()),
            MIN_DIFFICULTY
        );
    }

    #[test]
    fn test_only_most_recent_window_counts() {
        // Ancient slow blocks followed by a fast window
        let mut blocks = chain(100_000, 6, 3);
        let start = blocks.last().unwrap().get_timestamp();
        for i in 1..=5 {
            blocks.push(Block::new_test_block(start + i * 10, 3));
        }
        assert_eq!(
            DifficultyAdjustment::calculate_next_difficulty(&blocks, &params()),
            4
        );
    }

    #[test]
    fn test_uses_difficulty_of_latest_block() {
        let mut blocks = chain(100, 4, 9);
        blocks.push(Block::new_test_block(400, 5));
        assert_eq!(
            DifficultyAdjustment::calculate_next_difficulty(&blocks, &params()),
            6
        );
    }
}

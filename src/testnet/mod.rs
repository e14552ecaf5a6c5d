//! Deterministic fixtures for unit tests
//!
//! Fake keys and signatures that verify without ring, and consensus
//! parameters cheap enough to mine many blocks in a test.

pub mod test_utils;

pub use test_utils::*;

//! Block producer tuning.
//!
//! Producers start with a small working buffer so the first bytes are
//! available quickly, then double it after every pass until the cap is
//! reached. Larger batches amortize handoff overhead; the cap bounds
//! memory and per-block latency.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Cipher block size in bytes (AES).
pub const BLOCK_SIZE: usize = 16;

/// Cipher key size in bytes (AES-128).
pub const KEY_SIZE: usize = 16;

/// Default starting buffer size, in cipher blocks.
pub const DEFAULT_MIN_BLOCKS: usize = 256;

/// Default buffer cap, in cipher blocks.
pub const DEFAULT_MAX_BLOCKS: usize = 65536;

/// Buffer growth settings for a block producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Buffer size of the first pass, in cipher blocks.
    pub min_blocks: usize,
    /// Buffer size once growth stops, in cipher blocks.
    pub max_blocks: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            min_blocks: DEFAULT_MIN_BLOCKS,
            max_blocks: DEFAULT_MAX_BLOCKS,
        }
    }
}

impl ProducerConfig {
    /// Creates a configuration with a fixed buffer size (no growth).
    pub fn fixed(blocks: usize) -> Self {
        Self {
            min_blocks: blocks,
            max_blocks: blocks,
        }
    }

    /// Validates the block bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_blocks == 0 {
            return Err(ConfigError::InvalidMinBlocks);
        }
        if self.max_blocks < self.min_blocks {
            return Err(ConfigError::InvalidMaxBlocks {
                min: self.min_blocks,
                max: self.max_blocks,
            });
        }
        Ok(())
    }

    /// Block count of the pass following one with `current` blocks.
    #[inline]
    pub fn next_blocks(&self, current: usize) -> usize {
        current.saturating_mul(2).min(self.max_blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ProducerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_min_blocks_invalid() {
        let config = ProducerConfig {
            min_blocks: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMinBlocks)
        ));
    }

    #[test]
    fn test_max_below_min_invalid() {
        let config = ProducerConfig {
            min_blocks: 512,
            max_blocks: 256,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxBlocks { min: 512, max: 256 })
        ));
    }

    #[test]
    fn test_growth_clamped_to_cap() {
        let config = ProducerConfig {
            min_blocks: 3,
            max_blocks: 10,
        };
        assert_eq!(config.next_blocks(3), 6);
        assert_eq!(config.next_blocks(6), 10);
        assert_eq!(config.next_blocks(10), 10);
    }
}

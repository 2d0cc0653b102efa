//! Quality thresholds for the output self-test.

use super::statistics::StatisticalTests;
use serde::{Deserialize, Serialize};

/// Quality thresholds for generator output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Maximum acceptable bit bias (absolute value).
    pub max_bit_bias: f64,
    /// Minimum acceptable variance.
    pub min_variance: f64,
    /// Maximum acceptable autocorrelation (absolute value).
    pub max_autocorrelation: f64,
    /// Minimum acceptable deflate ratio.
    pub min_compression_ratio: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            max_bit_bias: 0.05,
            min_variance: 500.0,
            max_autocorrelation: 0.3,
            min_compression_ratio: 0.99,
        }
    }
}

impl QualityThresholds {
    /// Creates more permissive thresholds (for small samples).
    pub fn permissive() -> Self {
        Self {
            max_bit_bias: 0.2,
            min_variance: 100.0,
            max_autocorrelation: 0.5,
            min_compression_ratio: 0.9,
        }
    }

    /// Checks statistics against thresholds.
    pub fn check(&self, stats: &StatisticalTests) -> Result<(), ThresholdViolation> {
        if stats.bit_bias.abs() > self.max_bit_bias {
            return Err(ThresholdViolation::BitBias {
                observed: stats.bit_bias,
                threshold: self.max_bit_bias,
            });
        }

        if stats.variance < self.min_variance {
            return Err(ThresholdViolation::LowVariance {
                observed: stats.variance,
                threshold: self.min_variance,
            });
        }

        if stats.autocorrelation.abs() > self.max_autocorrelation {
            return Err(ThresholdViolation::HighAutocorrelation {
                observed: stats.autocorrelation,
                threshold: self.max_autocorrelation,
            });
        }

        if stats.compression_ratio < self.min_compression_ratio {
            return Err(ThresholdViolation::Compressible {
                observed: stats.compression_ratio,
                threshold: self.min_compression_ratio,
            });
        }

        Ok(())
    }
}

/// Threshold violation types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ThresholdViolation {
    #[error("bit bias {observed:.4} exceeds threshold {threshold:.4}")]
    BitBias { observed: f64, threshold: f64 },

    #[error("variance {observed:.2} below threshold {threshold:.2}")]
    LowVariance { observed: f64, threshold: f64 },

    #[error("autocorrelation {observed:.4} exceeds threshold {threshold:.4}")]
    HighAutocorrelation { observed: f64, threshold: f64 },

    #[error("compression ratio {observed:.4} below threshold {threshold:.4}")]
    Compressible { observed: f64, threshold: f64 },
}

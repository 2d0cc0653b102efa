//! Statistical tests for output quality.
//!
//! These tests are sanity checks to detect obvious problems,
//! not proofs of randomness. Passing these tests is necessary
//! but not sufficient for good output.

use flate2::{write::DeflateEncoder, Compression};
use std::io::Write;

/// Deflate level used for the compressibility check.
const COMPRESSION_LEVEL: u32 = 5;

/// Statistical test results.
#[derive(Debug, Clone)]
pub struct StatisticalTests {
    /// Bit bias (deviation from 0.5).
    pub bit_bias: f64,
    /// Byte-level variance.
    pub variance: f64,
    /// Lag-1 autocorrelation.
    pub autocorrelation: f64,
    /// Deflated size divided by original size.
    pub compression_ratio: f64,
    /// Number of bytes analyzed.
    pub sample_size: usize,
}

impl StatisticalTests {
    /// Runs all statistical tests on a sample.
    pub fn analyze(data: &[u8]) -> Self {
        Self {
            bit_bias: Self::compute_bit_bias(data),
            variance: Self::compute_variance(data),
            autocorrelation: Self::compute_autocorrelation(data),
            compression_ratio: Self::compute_compression_ratio(data),
            sample_size: data.len(),
        }
    }

    /// Fraction of set bits minus 0.5, in [-0.5, 0.5].
    fn compute_bit_bias(data: &[u8]) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let ones: u64 = data.iter().map(|b| b.count_ones() as u64).sum();
        (ones as f64 / (data.len() * 8) as f64) - 0.5
    }

    /// Computes the variance of byte values.
    fn compute_variance(data: &[u8]) -> f64 {
        if data.is_empty() {
            return 0.0;
        }

        let n = data.len() as f64;
        let mean: f64 = data.iter().map(|&b| b as f64).sum::<f64>() / n;
        data.iter().map(|&b| (b as f64 - mean).powi(2)).sum::<f64>() / n
    }

    /// Computes lag-1 autocorrelation.
    ///
    /// Measures correlation between consecutive bytes.
    /// High values indicate predictable patterns.
    fn compute_autocorrelation(data: &[u8]) -> f64 {
        if data.len() < 2 {
            return 0.0;
        }

        let n = data.len() as f64;
        let mean: f64 = data.iter().map(|&b| b as f64).sum::<f64>() / n;

        let variance: f64 = data.iter().map(|&b| (b as f64 - mean).powi(2)).sum::<f64>();

        if variance == 0.0 {
            return 1.0; // All same value = perfect correlation
        }

        let covariance: f64 = data
            .windows(2)
            .map(|w| (w[0] as f64 - mean) * (w[1] as f64 - mean))
            .sum();

        covariance / variance
    }

    /// Deflates the sample and compares sizes.
    ///
    /// High-entropy data does not compress, so the ratio stays near 1.0
    /// (slightly above, from framing overhead).
    fn compute_compression_ratio(data: &[u8]) -> f64 {
        if data.is_empty() {
            return 1.0;
        }

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
        let compressed = encoder
            .write_all(data)
            .and_then(|()| encoder.finish())
            .map(|out| out.len())
            // Writing into a Vec cannot fail; treat the impossible case as incompressible
            .unwrap_or(data.len());

        compressed as f64 / data.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::QualityThresholds;
    use rand_core::{OsRng, RngCore};

    #[test]
    fn test_random_data_passes() {
        let mut data = vec![0u8; 64 * 1024];
        OsRng.fill_bytes(&mut data);

        let stats = StatisticalTests::analyze(&data);

        assert!(QualityThresholds::default().check(&stats).is_ok());
        assert!(stats.compression_ratio >= 0.99);
        assert_eq!(stats.sample_size, data.len());
    }

    #[test]
    fn test_constant_data_fails() {
        let data = vec![0x80u8; 1000];
        let stats = StatisticalTests::analyze(&data);

        // Constant data: zero variance, perfect autocorrelation, compresses well
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.autocorrelation, 1.0);
        assert!(stats.compression_ratio < 0.1);
        assert!(QualityThresholds::permissive().check(&stats).is_err());
    }

    #[test]
    fn test_all_ones_biased() {
        let data = vec![0xFFu8; 1000];
        let stats = StatisticalTests::analyze(&data);

        // All ones = maximum positive bias
        assert!((stats.bit_bias - 0.5).abs() < 0.001);
        assert!(QualityThresholds::permissive().check(&stats).is_err());
    }

    #[test]
    fn test_alternating_bits_unbiased() {
        let data = vec![0xAAu8; 100];
        let stats = StatisticalTests::analyze(&data);
        assert!(stats.bit_bias.abs() < 0.001);
    }

    #[test]
    fn test_counter_pattern_compresses() {
        // Passes the moment checks but is trivially predictable
        let data: Vec<u8> = (0..64 * 1024).map(|i| (i * 17 + 31) as u8).collect();
        let stats = StatisticalTests::analyze(&data);

        assert!(stats.variance > 100.0);
        assert!(stats.compression_ratio < 0.5);
    }

    #[test]
    fn test_empty_sample() {
        let stats = StatisticalTests::analyze(&[]);
        assert_eq!(stats.sample_size, 0);
        assert_eq!(stats.bit_bias, 0.0);
    }
}

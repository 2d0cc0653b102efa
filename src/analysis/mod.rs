//! Output sanity checks.
//!
//! Statistical tests over a sample of generator output. They catch gross
//! failures such as a stuck or unseeded cipher; passing them says nothing
//! about cryptographic strength.

mod statistics;
mod threshold;

pub use statistics::StatisticalTests;
pub use threshold::{QualityThresholds, ThresholdViolation};

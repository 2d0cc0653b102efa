//! Generator and CLI configuration.
//!
//! Settings come from defaults, an optional TOML file, and finally
//! command-line overrides applied by the binary.

use crate::analysis::QualityThresholds;
use crate::producer::ProducerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    InvalidWorkers,
    #[error("minimum block count must be at least 1")]
    InvalidMinBlocks,
    #[error("maximum block count {max} is below minimum {min}")]
    InvalidMaxBlocks { min: usize, max: usize },
    #[error("self-test sample size must be at least 1 byte")]
    InvalidSampleSize,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Settings for one [`Generator`](crate::Generator).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Producers started when the generator is built.
    pub workers: usize,
    /// Finished buffers that may wait in the handoff channel.
    pub handoff_capacity: usize,
    /// Producer buffer growth.
    pub producer: ProducerConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            handoff_capacity: 1,
            producer: ProducerConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration with the given initial worker count.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        self.producer.validate()
    }
}

/// Output configuration for the command-line tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write even when stdout is a terminal.
    pub force: bool,
    /// Run the statistical self-test before emitting output.
    pub self_test: bool,
    /// Bytes drawn for the self-test.
    pub self_test_bytes: usize,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            force: false,
            self_test: false,
            self_test_bytes: 1 << 20,
            metrics_port: 0,
        }
    }
}

/// Seed source selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SeedConfig {
    /// Read key and IV material from this file instead of the OS RNG.
    pub path: Option<PathBuf>,
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub health: QualityThresholds,
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generator.validate()?;
        if self.output.self_test_bytes == 0 {
            return Err(ConfigError::InvalidSampleSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_invalid() {
        assert!(matches!(
            GeneratorConfig::with_workers(0).validate(),
            Err(ConfigError::InvalidWorkers)
        ));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = FileConfig::from_toml(
            r#"
            [generator]
            workers = 4

            [generator.producer]
            max_blocks = 1024

            [seed]
            path = "/dev/random"

            [output]
            force = true
            "#,
        )
        .unwrap();

        assert_eq!(config.generator.workers, 4);
        assert_eq!(config.generator.handoff_capacity, 1);
        assert_eq!(config.generator.producer.min_blocks, 256);
        assert_eq!(config.generator.producer.max_blocks, 1024);
        assert_eq!(config.seed.path, Some(PathBuf::from("/dev/random")));
        assert!(config.output.force);
        assert!(!config.output.self_test);
    }

    #[test]
    fn test_parse_rejects_invalid_bounds() {
        let result = FileConfig::from_toml(
            r#"
            [generator.producer]
            min_blocks = 64
            max_blocks = 32
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidMaxBlocks { .. })));
    }

    #[test]
    fn test_parse_error_reported() {
        assert!(matches!(
            FileConfig::from_toml("generator = 3"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_sample_config_parses() {
        let config = FileConfig::from_toml(include_str!("../cbcrand.toml")).unwrap();
        assert_eq!(config.generator.workers, 4);
        assert!(config.seed.path.is_none());
        assert_eq!(config.output.self_test_bytes, 1 << 20);
    }
}

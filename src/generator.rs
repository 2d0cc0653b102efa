//! The generator: a producer pool plus the stream that multiplexes it.
//!
//! [`Generator`] is an explicit, constructible instance with full control
//! over its lifecycle. [`global`] lazily builds a process-wide default
//! instance for callers that just want random bytes.

use crate::analysis::{QualityThresholds, StatisticalTests, ThresholdViolation};
use crate::config::{ConfigError, GeneratorConfig};
use crate::metrics::{GeneratorMetrics, MetricsError};
use crate::pool::{PoolError, PoolManager, ProducerContext};
use crate::seed::{OsSeedSource, SeedError, SeedSource};
use crate::stream::BlockStream;
use crossbeam::channel;
use std::io::{self, Read};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Errors raised while building or driving a generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("seed source failed: {0}")]
    Seed(#[from] SeedError),
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("output failed self-test: {0}")]
    SelfTest(#[from] ThresholdViolation),
    #[error("stream error: {0}")]
    Io(#[from] io::Error),
}

/// A parallel pseudo-random byte generator.
///
/// Producers run on their own threads from construction until the
/// generator is dropped. Reads may be issued from any number of threads
/// through a shared reference.
pub struct Generator {
    // Dropped first: closing the handoff releases parked producers
    stream: BlockStream,
    pool: PoolManager,
    metrics: Arc<GeneratorMetrics>,
    config: GeneratorConfig,
}

impl Generator {
    /// Creates a generator with one producer, seeded from the OS.
    pub fn new() -> Result<Self, GeneratorError> {
        Self::with_config(GeneratorConfig::default())
    }

    /// Creates a generator from `config`, seeded from the OS.
    pub fn with_config(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        Self::with_seed_source(config, Arc::new(OsSeedSource))
    }

    /// Creates a generator whose producers draw keys and IVs from `seed`.
    pub fn with_seed_source(
        config: GeneratorConfig,
        seed: Arc<dyn SeedSource>,
    ) -> Result<Self, GeneratorError> {
        config.validate()?;

        let metrics = Arc::new(GeneratorMetrics::new()?);
        let (handoff, blocks) = channel::bounded(config.handoff_capacity);
        let (faults, fault_rx) = channel::unbounded();

        let ctx = ProducerContext {
            config: config.producer,
            seed,
            handoff,
            faults,
            metrics: Arc::clone(&metrics),
        };
        let pool = PoolManager::start(ctx, config.workers)?;
        let stream = BlockStream::new(blocks, fault_rx, Arc::clone(&metrics));

        tracing::debug!(
            workers = config.workers,
            min_blocks = config.producer.min_blocks,
            max_blocks = config.producer.max_blocks,
            "Generator started"
        );

        Ok(Self {
            stream,
            pool,
            metrics,
            config,
        })
    }

    /// Sets the number of producers and returns the previous count.
    ///
    /// A count below 1 leaves the pool unchanged.
    pub fn set_workers(&self, workers: usize) -> Result<usize, GeneratorError> {
        Ok(self.pool.set_workers(workers)?)
    }

    /// Returns the current number of producers.
    pub fn workers(&self) -> Result<usize, GeneratorError> {
        Ok(self.pool.workers()?)
    }

    /// Reads up to `buf.len()` bytes. See [`BlockStream::read`].
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    /// Fills `buf` completely.
    pub fn fill(&self, buf: &mut [u8]) -> io::Result<()> {
        self.stream.fill(buf)
    }

    /// Draws `sample_len` bytes and checks them against `thresholds`.
    ///
    /// The sample is consumed from the stream and not returned.
    pub fn self_test(
        &self,
        sample_len: usize,
        thresholds: &QualityThresholds,
    ) -> Result<StatisticalTests, GeneratorError> {
        if sample_len == 0 {
            return Err(ConfigError::InvalidSampleSize.into());
        }

        let mut sample = vec![0u8; sample_len];
        self.fill(&mut sample)?;

        let stats = StatisticalTests::analyze(&sample);
        match thresholds.check(&stats) {
            Ok(()) => {
                tracing::info!(
                    bytes = sample_len,
                    bias = stats.bit_bias,
                    autocorr = stats.autocorrelation,
                    ratio = stats.compression_ratio,
                    "Self-test passed"
                );
                Ok(stats)
            }
            Err(violation) => {
                tracing::warn!(violation = %violation, "Self-test failed");
                Err(violation.into())
            }
        }
    }

    /// Returns the underlying stream.
    pub fn stream(&self) -> &BlockStream {
        &self.stream
    }

    /// Returns this generator's metrics.
    pub fn metrics(&self) -> &GeneratorMetrics {
        &self.metrics
    }

    /// Returns a shared handle to this generator's metrics.
    pub fn metrics_handle(&self) -> Arc<GeneratorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the configuration the generator was built with.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl Read for &Generator {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Generator::read(self, buf)
    }
}

impl Read for Generator {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Generator::read(self, buf)
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("stream", &self.stream)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

static GLOBAL: OnceLock<Generator> = OnceLock::new();

/// Returns the process-wide generator, starting it on first use.
///
/// The default instance begins with one producer; raise it with
/// [`set_workers`] to match the available parallelism.
pub fn global() -> Result<&'static Generator, GeneratorError> {
    if let Some(generator) = GLOBAL.get() {
        return Ok(generator);
    }
    let generator = Generator::new()?;
    // A racing initializer may win; the loser is dropped and shut down
    Ok(GLOBAL.get_or_init(|| generator))
}

/// Fills `buf` from the process-wide generator.
pub fn read(buf: &mut [u8]) -> io::Result<()> {
    global()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
        .fill(buf)
}

/// Sets the process-wide generator's producer count and returns the
/// previous count. Counts below 1 are ignored.
pub fn set_workers(workers: usize) -> Result<usize, GeneratorError> {
    global()?.set_workers(workers)
}

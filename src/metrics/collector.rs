//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A plain copy of the generator's counters at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Producer threads currently running.
    pub producers_live: u64,
    /// Worker count applied by the most recent resize.
    pub pool_workers: u64,
    /// Resize requests that changed the pool.
    pub pool_resizes: u64,
    /// Buffers accepted by the handoff channel.
    pub blocks_delivered: u64,
    /// Bytes accepted by the handoff channel.
    pub bytes_delivered: u64,
    /// Bytes copied out to readers.
    pub bytes_read: u64,
    /// Producers that failed to seed.
    pub seed_failures: u64,
}

/// Prometheus metrics for one generator.
///
/// Each generator owns its own registry, so isolated instances never
/// collide on metric names.
pub struct GeneratorMetrics {
    registry: Registry,

    // Pool metrics
    producers_live: IntGauge,
    pool_workers: IntGauge,
    pool_resizes_total: IntCounter,

    // Throughput metrics
    blocks_delivered_total: IntCounter,
    bytes_delivered_total: IntCounter,
    bytes_read_total: IntCounter,

    // Fault metrics
    seed_failures_total: IntCounter,
}

impl GeneratorMetrics {
    /// Creates a registry with all generator metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let producers_live = IntGauge::new(
            "cbcrand_producers_live",
            "Number of block producer threads currently running",
        )?;
        let pool_workers = IntGauge::new(
            "cbcrand_pool_workers",
            "Worker count applied by the most recent resize",
        )?;
        let pool_resizes_total = IntCounter::new(
            "cbcrand_pool_resizes_total",
            "Total resize requests that changed the producer pool",
        )?;

        let blocks_delivered_total = IntCounter::new(
            "cbcrand_blocks_delivered_total",
            "Total buffers handed off by producers",
        )?;
        let bytes_delivered_total = IntCounter::new(
            "cbcrand_bytes_delivered_total",
            "Total bytes handed off by producers",
        )?;
        let bytes_read_total = IntCounter::new(
            "cbcrand_bytes_read_total",
            "Total bytes copied out of the stream",
        )?;

        let seed_failures_total = IntCounter::new(
            "cbcrand_seed_failures_total",
            "Total producers that could not obtain seed material",
        )?;

        registry.register(Box::new(producers_live.clone()))?;
        registry.register(Box::new(pool_workers.clone()))?;
        registry.register(Box::new(pool_resizes_total.clone()))?;
        registry.register(Box::new(blocks_delivered_total.clone()))?;
        registry.register(Box::new(bytes_delivered_total.clone()))?;
        registry.register(Box::new(bytes_read_total.clone()))?;
        registry.register(Box::new(seed_failures_total.clone()))?;

        Ok(Self {
            registry,
            producers_live,
            pool_workers,
            pool_resizes_total,
            blocks_delivered_total,
            bytes_delivered_total,
            bytes_read_total,
            seed_failures_total,
        })
    }

    pub(crate) fn producer_started(&self) {
        self.producers_live.inc();
    }

    pub(crate) fn producer_stopped(&self) {
        self.producers_live.dec();
    }

    pub(crate) fn record_resize(&self, workers: usize) {
        self.pool_workers.set(workers as i64);
        self.pool_resizes_total.inc();
    }

    pub(crate) fn record_block(&self, bytes: usize) {
        self.blocks_delivered_total.inc();
        self.bytes_delivered_total.inc_by(bytes as u64);
    }

    pub(crate) fn record_read(&self, bytes: usize) {
        self.bytes_read_total.inc_by(bytes as u64);
    }

    pub(crate) fn record_seed_failure(&self) {
        self.seed_failures_total.inc();
    }

    /// Returns the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            producers_live: self.producers_live.get().max(0) as u64,
            pool_workers: self.pool_workers.get().max(0) as u64,
            pool_resizes: self.pool_resizes_total.get(),
            blocks_delivered: self.blocks_delivered_total.get(),
            bytes_delivered: self.bytes_delivered_total.get(),
            bytes_read: self.bytes_read_total.get(),
            seed_failures: self.seed_failures_total.get(),
        }
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for GeneratorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorMetrics")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let metrics = GeneratorMetrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_two_registries_coexist() {
        let a = GeneratorMetrics::new().unwrap();
        let b = GeneratorMetrics::new().unwrap();

        a.record_read(10);
        assert_eq!(a.snapshot().bytes_read, 10);
        assert_eq!(b.snapshot().bytes_read, 0);
    }

    #[test]
    fn test_snapshot_tracks_updates() {
        let metrics = GeneratorMetrics::new().unwrap();

        metrics.producer_started();
        metrics.producer_started();
        metrics.producer_stopped();
        metrics.record_resize(2);
        metrics.record_block(4096);
        metrics.record_block(8192);
        metrics.record_read(100);
        metrics.record_seed_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.producers_live, 1);
        assert_eq!(snapshot.pool_workers, 2);
        assert_eq!(snapshot.pool_resizes, 1);
        assert_eq!(snapshot.blocks_delivered, 2);
        assert_eq!(snapshot.bytes_delivered, 12288);
        assert_eq!(snapshot.bytes_read, 100);
        assert_eq!(snapshot.seed_failures, 1);
    }

    #[test]
    fn test_metrics_encode() {
        let metrics = GeneratorMetrics::new().unwrap();
        metrics.record_resize(4);

        let output = metrics.encode().unwrap();
        assert!(output.contains("cbcrand_pool_workers 4"));
        assert!(output.contains("cbcrand_producers_live"));
        assert!(output.contains("cbcrand_bytes_read_total"));
    }
}

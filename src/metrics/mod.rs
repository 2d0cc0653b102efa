//! Prometheus metrics for generator observability.
//!
//! # Metrics Exposed
//!
//! ## Pool Metrics
//! - `cbcrand_producers_live` - Producer threads currently running
//! - `cbcrand_pool_workers` - Worker count applied by the latest resize
//! - `cbcrand_pool_resizes_total` - Resizes that changed the pool
//!
//! ## Throughput Metrics
//! - `cbcrand_blocks_delivered_total` - Buffers handed off by producers
//! - `cbcrand_bytes_delivered_total` - Bytes handed off by producers
//! - `cbcrand_bytes_read_total` - Bytes copied out to readers
//!
//! ## Fault Metrics
//! - `cbcrand_seed_failures_total` - Producers that failed to seed
//!
//! # Example
//!
//! ```no_run
//! use cbcrand::Generator;
//!
//! let generator = Generator::new().expect("Failed to start generator");
//! let mut buf = [0u8; 64];
//! generator.fill(&mut buf).unwrap();
//!
//! println!("{}", generator.metrics().encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{GeneratorMetrics, MetricsError, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};

//! High-throughput parallel pseudo-random byte generator.
//!
//! A faster, CPU-parallel substitute for a blocking OS entropy device.
//! Several producer threads each run AES-128 in CBC mode over their own
//! buffer, seeded once from the operating system; their finished buffers
//! are multiplexed into one readable byte stream.
//!
//! # Architecture
//!
//! ```text
//! seed source → producers (×N) → handoff channel → stream → caller
//!                    ↑
//!              pool manager (resize requests)
//! ```
//!
//! # Design Principles
//!
//! - **Back-pressure, not throttling**: producers park on a full handoff
//!   channel, so an idle reader costs no CPU
//! - **Independent seeding**: every producer draws its own key and IV
//! - **Fail-closed**: a seed failure poisons the stream instead of
//!   emitting output from an unseeded cipher
//! - **No cryptographic claims**: the chained cipher is an expansion
//!   function, not a vetted CSPRNG construction
//!
//! # Example
//!
//! ```no_run
//! use cbcrand::Generator;
//! use std::io::Read;
//!
//! let generator = Generator::new().unwrap();
//! let workers = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
//! generator.set_workers(workers).unwrap();
//!
//! let mut key = [0u8; 32];
//! generator.fill(&mut key).unwrap();
//!
//! // Any `Read` consumer works too
//! let mut sample = Vec::new();
//! (&generator).take(1 << 20).read_to_end(&mut sample).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod count;
pub mod generator;
pub mod metrics;
pub mod pool;
pub mod producer;
pub mod seed;
pub mod stream;

// Re-export commonly used types at crate root
pub use analysis::{QualityThresholds, StatisticalTests, ThresholdViolation};
pub use config::{ConfigError, FileConfig, GeneratorConfig};
pub use count::ByteCount;
pub use generator::{global, read, set_workers, Generator, GeneratorError};
pub use metrics::{GeneratorMetrics, MetricsSnapshot};
pub use producer::ProducerConfig;
pub use seed::{OsSeedSource, SeedError, SeedSource};
pub use stream::BlockStream;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

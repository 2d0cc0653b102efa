//! Block producers.
//!
//! A producer owns one AES-CBC encryptor, seeded once, and keeps
//! re-encrypting its working buffer to manufacture pseudo-random blocks.
//! Finished buffers are offered on the shared handoff channel; a full
//! channel parks the producer until the stream drains it or the producer
//! is cancelled.

mod block;
mod cancel;
mod config;

pub use block::BlockProducer;
pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use config::{
    ProducerConfig, BLOCK_SIZE, DEFAULT_MAX_BLOCKS, DEFAULT_MIN_BLOCKS, KEY_SIZE,
};

//! Seed material for block producers.
//!
//! Every producer draws its cipher key and initialization vector from a
//! [`SeedSource`] exactly once, when it starts. A source that cannot
//! supply the requested bytes is a fatal fault for that producer.

mod source;

pub use source::{FileSeedSource, OsSeedSource, SeedError, SeedSource};

//! Producer pool management.
//!
//! The [`PoolManager`] is the only owner of the live producer set. Resize
//! requests travel over a single-slot control channel and are applied one
//! at a time by a dedicated control thread, so producers and readers never
//! observe a half-applied resize.

mod manager;
mod worker;

pub use manager::{PoolError, PoolManager};
pub(crate) use worker::ProducerContext;

//! Producer thread spawning.

use crate::metrics::GeneratorMetrics;
use crate::producer::{cancel_pair, BlockProducer, CancelHandle, ProducerConfig};
use crate::seed::{SeedError, SeedSource};
use crossbeam::channel::Sender;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Everything a producer thread needs, cloned once per producer.
#[derive(Clone)]
pub(crate) struct ProducerContext {
    pub config: ProducerConfig,
    pub seed: Arc<dyn SeedSource>,
    pub handoff: Sender<Vec<u8>>,
    pub faults: Sender<SeedError>,
    pub metrics: Arc<GeneratorMetrics>,
}

/// Pool-side handle to one running producer.
pub(crate) struct ProducerHandle {
    id: usize,
    cancel: CancelHandle,
    thread: JoinHandle<()>,
}

impl ProducerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns true once the producer thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Signals the producer and detaches it. The thread exits at its next
    /// handoff checkpoint.
    pub fn cancel(self) {
        self.cancel.cancel();
    }

    /// Signals the producer and waits for its thread to exit.
    pub fn stop(self) {
        let Self { id, cancel, thread } = self;
        cancel.cancel();
        if thread.join().is_err() {
            tracing::warn!(producer = id, "Producer thread panicked");
        }
    }
}

/// Keeps `producers_live` accurate for the lifetime of a producer thread.
struct LiveGuard<'a>(&'a GeneratorMetrics);

impl<'a> LiveGuard<'a> {
    fn enter(metrics: &'a GeneratorMetrics) -> Self {
        metrics.producer_started();
        Self(metrics)
    }
}

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.producer_stopped();
    }
}

/// Starts producer `id` on its own thread.
///
/// Seeding happens on the new thread. A seed failure is logged, counted,
/// and reported on the fault channel; the thread then exits.
pub(crate) fn spawn_producer(id: usize, ctx: ProducerContext) -> io::Result<ProducerHandle> {
    let (cancel, token) = cancel_pair();

    let thread = thread::Builder::new()
        .name(format!("cbcrand-producer-{id}"))
        .spawn(move || {
            let _live = LiveGuard::enter(&ctx.metrics);

            match BlockProducer::new(id, ctx.config, ctx.seed.as_ref()) {
                Ok(producer) => producer.run(&ctx.handoff, &token, &ctx.metrics),
                Err(e) => {
                    tracing::error!(producer = id, error = %e, "Producer could not be seeded");
                    ctx.metrics.record_seed_failure();
                    let _ = ctx.faults.send(e);
                }
            }
        })?;

    Ok(ProducerHandle { id, cancel, thread })
}

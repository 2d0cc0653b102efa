//! Resize control loop.

use super::worker::{spawn_producer, ProducerContext, ProducerHandle};
use crossbeam::channel::{self, Receiver, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Errors raised by pool control operations.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to spawn pool thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("producer pool has stopped")]
    Stopped,
}

/// A request to resize the pool.
struct Resize {
    /// Desired producer count; values below 1 leave the pool unchanged.
    target: usize,
    /// Receives the producer count in effect before this request.
    reply: Sender<Result<usize, PoolError>>,
}

/// Owner of the producer set.
///
/// Dropping the manager stops the control thread, which in turn cancels
/// and joins every remaining producer.
#[derive(Debug)]
pub struct PoolManager {
    control: Option<Sender<Resize>>,
    thread: Option<JoinHandle<()>>,
}

impl PoolManager {
    /// Starts the control thread and applies the initial size.
    ///
    /// Fails unless every one of the `initial` producers (at least one)
    /// could be started.
    pub(crate) fn start(ctx: ProducerContext, initial: usize) -> Result<Self, PoolError> {
        let (control, requests) = channel::bounded(1);

        let thread = thread::Builder::new()
            .name("cbcrand-pool".into())
            .spawn(move || control_loop(requests, ctx))
            .map_err(PoolError::Spawn)?;

        let pool = Self {
            control: Some(control),
            thread: Some(thread),
        };
        // On error, dropping `pool` joins whatever producers did start
        pool.set_workers(initial.max(1))?;
        Ok(pool)
    }

    /// Sets the number of producers and returns the previous count.
    ///
    /// A target below 1 is ignored and the current count is returned.
    /// Counts only producers whose threads are still running, so one that
    /// exited after failing to seed is no longer included. Blocks until
    /// the request has been applied; does not wait for cancelled
    /// producers to exit.
    ///
    /// If a producer thread cannot be spawned, the pool keeps the
    /// producers it already has and [`PoolError::Spawn`] is returned.
    pub fn set_workers(&self, target: usize) -> Result<usize, PoolError> {
        let control = self.control.as_ref().ok_or(PoolError::Stopped)?;
        let (reply, outcome) = channel::bounded(1);

        control
            .send(Resize { target, reply })
            .map_err(|_| PoolError::Stopped)?;

        outcome.recv().map_err(|_| PoolError::Stopped)?
    }

    /// Returns the current producer count.
    pub fn workers(&self) -> Result<usize, PoolError> {
        self.set_workers(0)
    }

    /// Stops the control thread and joins all producers.
    pub fn shutdown(&mut self) {
        drop(self.control.take());

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Pool control thread panicked");
            }
        }
    }
}

impl Drop for PoolManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Applies resize requests until every control sender is gone.
fn control_loop(requests: Receiver<Resize>, ctx: ProducerContext) {
    let mut live: Vec<ProducerHandle> = Vec::new();
    let mut next_id = 0;

    for request in requests.iter() {
        reap_finished(&mut live);
        let previous = live.len();

        let outcome = resize(&mut live, request.target, || {
            let id = next_id;
            let handle = spawn_producer(id, ctx.clone())?;
            next_id += 1;
            Ok(handle)
        });

        if live.len() != previous {
            ctx.metrics.record_resize(live.len());
            tracing::info!(previous, current = live.len(), "Resized producer pool");
        }

        let _ = request.reply.send(outcome);
    }

    tracing::debug!(producers = live.len(), "Pool shutting down");
    for handle in live.drain(..) {
        handle.stop();
    }
}

/// Grows or shrinks `live` to `target` producers.
///
/// Returns the count before the change. Growth stops at the first spawn
/// failure; producers started before it are kept.
fn resize<F>(
    live: &mut Vec<ProducerHandle>,
    target: usize,
    mut spawn: F,
) -> Result<usize, PoolError>
where
    F: FnMut() -> io::Result<ProducerHandle>,
{
    let previous = live.len();

    if target < 1 {
        tracing::debug!(current = previous, "Ignoring resize below one producer");
        return Ok(previous);
    }

    while live.len() < target {
        match spawn() {
            Ok(handle) => live.push(handle),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    started = live.len(),
                    target,
                    "Failed to spawn producer thread"
                );
                return Err(PoolError::Spawn(e));
            }
        }
    }

    for handle in live.drain(target..) {
        tracing::debug!(producer = handle.id(), "Cancelling producer");
        handle.cancel();
    }

    Ok(previous)
}

/// Joins and removes producers whose threads have already exited.
fn reap_finished(live: &mut Vec<ProducerHandle>) {
    let (finished, running): (Vec<_>, Vec<_>) =
        live.drain(..).partition(ProducerHandle::is_finished);
    *live = running;

    for handle in finished {
        tracing::debug!(producer = handle.id(), "Reaping exited producer");
        handle.stop();
    }
}

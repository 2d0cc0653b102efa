//! Locked residual-buffer reader over the handoff channel.

use crate::metrics::GeneratorMetrics;
use crate::pool::PoolError;
use crate::seed::SeedError;
use crossbeam::channel::{select, Receiver};
use std::io::{self, Read};
use std::sync::{Arc, Mutex};

/// Reader state guarded by the stream lock.
#[derive(Debug, Default)]
struct StreamState {
    /// Most recently received producer buffer.
    block: Vec<u8>,
    /// Bytes of `block` already served; the residual is `block[offset..]`.
    offset: usize,
    /// Latched producer fault; once set, every read fails.
    fault: Option<SeedError>,
}

impl StreamState {
    fn residual(&self) -> &[u8] {
        &self.block[self.offset..]
    }

    fn refill(&mut self, block: Vec<u8>) {
        self.block = block;
        self.offset = 0;
    }

    fn consume(&mut self, n: usize) {
        self.offset += n;
        if self.offset == self.block.len() {
            self.block = Vec::new();
            self.offset = 0;
        }
    }
}

/// The single logical reader over all producers.
///
/// One read proceeds at a time: the stream lock is held for the whole of
/// a read call, including any wait for the next block.
pub struct BlockStream {
    state: Mutex<StreamState>,
    blocks: Receiver<Vec<u8>>,
    faults: Receiver<SeedError>,
    metrics: Arc<GeneratorMetrics>,
}

impl BlockStream {
    pub(crate) fn new(
        blocks: Receiver<Vec<u8>>,
        faults: Receiver<SeedError>,
        metrics: Arc<GeneratorMetrics>,
    ) -> Self {
        Self {
            state: Mutex::new(StreamState::default()),
            blocks,
            faults,
            metrics,
        }
    }

    /// Reads up to `dest.len()` bytes and returns how many were copied.
    ///
    /// Blocks while no producer buffer is available. Never returns `Ok(0)`
    /// for a non-empty destination. Fails only after a producer fault or
    /// once the pool has shut down.
    pub fn read(&self, dest: &mut [u8]) -> io::Result<usize> {
        if dest.is_empty() {
            return Ok(0);
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "stream lock poisoned"))?;

        if state.fault.is_none() {
            if let Ok(fault) = self.faults.try_recv() {
                state.fault = Some(fault);
            }
        }
        if let Some(fault) = &state.fault {
            return Err(fault_error(fault));
        }

        if state.residual().is_empty() {
            select! {
                recv(self.blocks) -> block => match block {
                    Ok(block) => state.refill(block),
                    Err(_) => return Err(stopped_error()),
                },
                recv(self.faults) -> fault => match fault {
                    Ok(fault) => {
                        let err = fault_error(&fault);
                        state.fault = Some(fault);
                        return Err(err);
                    }
                    Err(_) => return Err(stopped_error()),
                },
            }
        }

        let residual = state.residual();
        let n = dest.len().min(residual.len());
        dest[..n].copy_from_slice(&residual[..n]);
        state.consume(n);

        self.metrics.record_read(n);
        Ok(n)
    }

    /// Fills `dest` completely, reading as many blocks as needed.
    ///
    /// Short reads are retried; only a genuine stream error aborts.
    pub fn fill(&self, dest: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < dest.len() {
            filled += self.read(&mut dest[filled..])?;
        }
        Ok(())
    }

    /// Returns the unread bytes left over from the current block.
    pub fn residual_len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.residual().len())
            .unwrap_or(0)
    }
}

fn fault_error(fault: &SeedError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, fault.clone())
}

/// Not `BrokenPipe`: callers treat that as the sink going away.
fn stopped_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, PoolError::Stopped)
}

impl Read for &BlockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        BlockStream::read(self, buf)
    }
}

impl Read for BlockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        BlockStream::read(self, buf)
    }
}

impl std::fmt::Debug for BlockStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStream")
            .field("residual", &self.residual_len())
            .field("queued", &self.blocks.len())
            .finish_non_exhaustive()
    }
}

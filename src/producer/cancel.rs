//! Per-producer cancellation signal.
//!
//! Cancellation is modelled as a channel that never carries a value:
//! dropping the [`CancelHandle`] disconnects it, which every waiting
//! [`CancelToken`] observes at once, including producers parked in a
//! `select!` on the handoff channel.

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

/// Owning side of a cancellation signal. Dropping it cancels.
#[derive(Debug)]
pub struct CancelHandle {
    _tx: Sender<()>,
}

impl CancelHandle {
    /// Fires the signal.
    pub fn cancel(self) {}
}

/// Observing side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<()>,
}

impl CancelToken {
    /// Returns true once the paired handle has been cancelled or dropped.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready when the signal fires, for use in `select!`.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

/// Creates a connected handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = channel::bounded(0);
    (CancelHandle { _tx: tx }, CancelToken { rx })
}

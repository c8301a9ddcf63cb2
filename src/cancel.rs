use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A one-shot broadcast cancellation signal
///
/// Cloned into every stage task; the driver raises it exactly once and every
/// task observing it stops. Internally a rendezvous
/// channel that is never sent on: raising drops the only sender, so every
/// pending and future `recv` on [`CancelSignal::done`] resolves immediately.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    done: Receiver<()>,
    raised: Arc<AtomicBool>,
}

impl CancelSignal {
    /// Create a new signal in the active (not raised) state
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            sender: Arc::new(Mutex::new(Some(tx))),
            done: rx,
            raised: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raise the signal, waking every task waiting on it
    ///
    /// Idempotent: the first call closes the broadcast channel, subsequent
    /// calls are no-ops.
    pub fn raise(&self) {
        if !self.raised.swap(true, Ordering::SeqCst) {
            // Dropping the sole sender closes the channel for all receivers.
            self.sender.lock().take();
            tracing::debug!("cancellation raised");
        }
    }

    /// Non-blocking check of the signal state
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// A receiver that becomes ready the moment the signal is raised
    ///
    /// Suitable as a `recv` arm in `select!`: the channel carries no values,
    /// so the arm only fires on closure.
    pub fn done(&self) -> Receiver<()> {
        self.done.clone()
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

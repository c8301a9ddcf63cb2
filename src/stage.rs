use crate::cancel::CancelSignal;
use crate::metrics::StageMetrics;
use crossbeam::channel::{bounded, Receiver};
use crossbeam::select;
use std::thread::{self, JoinHandle};

/// A spawned stage: its output conduit plus the tasks driving it
///
/// The output channel closes when every task owning its sender has exited,
/// which is how completion propagates downstream.
pub struct SpawnedStage {
    pub output: Receiver<i64>,
    pub handles: Vec<JoinHandle<()>>,
}

/// Trait for a processing stage in the pipeline
///
/// A stage is handed the shared cancellation signal and its input conduit,
/// spawns one or more tasks, and returns its output conduit. All conduits
/// are zero-capacity rendezvous channels: a send blocks until the receiver
/// is ready, so back-pressure is implicit. Every blocking wait inside a
/// stage must race the cancellation signal so that raising it unblocks the
/// stage promptly.
pub trait Stage: Send + 'static {
    /// Get a human-readable name for this stage
    fn name(&self) -> &str {
        "stage"
    }

    /// Spawn the stage's tasks, wiring `input` to the returned output
    fn spawn(self: Box<Self>, cancel: CancelSignal, input: Receiver<i64>) -> SpawnedStage;
}

/// A stateless stage that forwards only values matching a predicate
///
/// Runs as a single task holding at most one value in flight: receive,
/// test, forward. Both the receive and the forward race cancellation.
pub struct FilterStage<F> {
    name: String,
    predicate: F,
    metrics: StageMetrics,
}

impl<F> FilterStage<F>
where
    F: Fn(i64) -> bool + Send + 'static,
{
    /// Create a new filter stage
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
            metrics: StageMetrics::new(),
        }
    }

    /// Get a handle to this stage's counters
    pub fn metrics(&self) -> StageMetrics {
        self.metrics.clone()
    }
}

impl FilterStage<fn(i64) -> bool> {
    /// Stage that forwards only strictly positive values
    ///
    /// Zero and negatives are dropped.
    pub fn positive() -> Self {
        Self::new("positive_filter", |v: i64| v > 0)
    }

    /// Stage that forwards only non-zero multiples of three
    ///
    /// Zero is excluded even though it divides evenly.
    pub fn multiple_of_three() -> Self {
        Self::new("multiple_of_three_filter", |v: i64| v % 3 == 0 && v != 0)
    }
}

impl<F> Stage for FilterStage<F>
where
    F: Fn(i64) -> bool + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(self: Box<Self>, cancel: CancelSignal, input: Receiver<i64>) -> SpawnedStage {
        let (tx, rx) = bounded(0);
        let handle = thread::spawn(move || {
            let done = cancel.done();
            tracing::debug!(stage = %self.name, "started");
            loop {
                let value = select! {
                    recv(input) -> msg => match msg {
                        Ok(v) => v,
                        // Upstream closed: everything in flight has been
                        // rendezvoused, so there is nothing left to do.
                        Err(_) => break,
                    },
                    recv(done) -> _ => break,
                };
                self.metrics.record_received();
                if !(self.predicate)(value) {
                    continue;
                }
                select! {
                    send(tx, value) -> res => {
                        if res.is_err() {
                            break; // downstream gone
                        }
                        self.metrics.record_forwarded();
                    }
                    recv(done) -> _ => break,
                }
            }
            tracing::debug!(stage = %self.name, "exiting");
        });
        SpawnedStage {
            output: rx,
            handles: vec![handle],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use std::time::Duration;

    /// Run a stage over a finite input and collect everything it emits.
    fn run_stage(stage: impl Stage, inputs: Vec<i64>) -> Vec<i64> {
        let cancel = CancelSignal::new();
        let (tx, source) = bounded(0);
        let spawned = Box::new(stage).spawn(cancel, source);
        let feeder = thread::spawn(move || {
            for v in inputs {
                if tx.send(v).is_err() {
                    break;
                }
            }
            // Dropping the sender closes the conduit.
        });
        let mut out = Vec::new();
        while let Ok(v) = spawned.output.recv_timeout(Duration::from_secs(5)) {
            out.push(v);
        }
        feeder.join().unwrap();
        for handle in spawned.handles {
            handle.join().unwrap();
        }
        out
    }

    #[test]
    fn positive_filter_drops_zero_and_negatives() {
        let out = run_stage(FilterStage::positive(), vec![-5, -1, 0, 1, 2, 3]);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn multiple_of_three_filter_drops_non_multiples_and_zero() {
        // -3 passes on its own: the positive filter is a separate stage.
        let out = run_stage(
            FilterStage::multiple_of_three(),
            vec![-3, 0, 1, 3, 4, 6, 7, 9],
        );
        assert_eq!(out, vec![-3, 3, 6, 9]);
    }

    #[test]
    fn custom_predicate_and_metrics() {
        let stage = FilterStage::new("even_filter", |v: i64| v % 2 == 0);
        let metrics = stage.metrics();
        let out = run_stage(stage, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(out, vec![2, 4, 6]);
        assert_eq!(metrics.received(), 6);
        assert_eq!(metrics.forwarded(), 3);
        assert_eq!(metrics.dropped(), 3);
    }

    #[test]
    fn cancellation_unblocks_a_pending_forward() {
        let cancel = CancelSignal::new();
        let (tx, source) = bounded(0);
        let SpawnedStage { output, handles } =
            Box::new(FilterStage::positive()).spawn(cancel.clone(), source);

        // The stage accepts the value, then blocks forwarding it: we hold
        // the output receiver but never receive.
        tx.send(7).unwrap();
        thread::sleep(Duration::from_millis(20));
        cancel.raise();

        let (joined_tx, joined_rx) = unbounded();
        thread::spawn(move || {
            for handle in handles {
                handle.join().unwrap();
            }
            let _ = joined_tx.send(());
        });
        assert!(
            joined_rx.recv_timeout(Duration::from_secs(1)).is_ok(),
            "stage task did not exit after cancellation"
        );
        drop(output);
    }
}

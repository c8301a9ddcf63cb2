use crate::buffer::RingBuffer;
use crate::cancel::CancelSignal;
use crate::error::{PipelineError, Result};
use crate::metrics::StageMetrics;
use crate::stage::{SpawnedStage, Stage};
use crossbeam::channel::{bounded, tick, Receiver, Sender};
use crossbeam::select;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Tunables for a buffering stage, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Maximum elements retained before the oldest is evicted
    pub capacity: usize,
    /// Timer period of the flush task, the maximum latency buffering adds
    pub flush_interval: Duration,
}

impl BufferConfig {
    /// Create a config with explicit values
    pub fn new(capacity: usize, flush_interval: Duration) -> Self {
        Self {
            capacity,
            flush_interval,
        }
    }

    /// Check the config for values the stage cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PipelineError::Config(
                "buffer capacity must be positive".into(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(PipelineError::Config(
                "flush interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            flush_interval: Duration::from_secs(5),
        }
    }
}

/// A stage that decouples arrival rate from emission rate
///
/// Two tasks share one [`RingBuffer`]: the ingestion task adds every
/// arriving value without ever blocking on the buffer, and the flush task
/// drains it on a fixed interval, forwarding the batch downstream in order.
/// Under sustained overload the buffer evicts its oldest element rather
/// than growing or stalling upstream.
#[derive(Debug)]
pub struct BufferStage {
    name: String,
    config: BufferConfig,
    buffer: Arc<RingBuffer>,
    metrics: StageMetrics,
}

impl BufferStage {
    /// Create a buffering stage, validating the config
    pub fn new(config: BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: "buffer".into(),
            config,
            buffer: Arc::new(RingBuffer::new(config.capacity)),
            metrics: StageMetrics::new(),
        })
    }

    /// Get a handle to this stage's counters
    pub fn metrics(&self) -> StageMetrics {
        self.metrics.clone()
    }

    /// The stage's ring buffer, shared with its running tasks
    pub fn buffer(&self) -> Arc<RingBuffer> {
        Arc::clone(&self.buffer)
    }
}

impl Stage for BufferStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(self: Box<Self>, cancel: CancelSignal, input: Receiver<i64>) -> SpawnedStage {
        let (tx, rx) = bounded(0);
        // Never sent on: the ingestion task owns the sender and drops it on
        // exit, telling the flush task that no more values can arrive.
        let (ingest_guard, ingest_closed) = bounded::<()>(0);

        let ingest = {
            let buffer = Arc::clone(&self.buffer);
            let metrics = self.metrics.clone();
            let cancel = cancel.clone();
            let name = self.name.clone();
            thread::spawn(move || {
                let _guard = ingest_guard;
                let done = cancel.done();
                tracing::debug!(stage = %name, "ingestion task started");
                loop {
                    select! {
                        recv(input) -> msg => match msg {
                            Ok(v) => {
                                metrics.record_received();
                                buffer.add(v);
                            }
                            Err(_) => break, // upstream closed
                        },
                        recv(done) -> _ => break,
                    }
                }
                tracing::debug!(stage = %name, "ingestion task exiting");
            })
        };

        let flush = {
            let buffer = Arc::clone(&self.buffer);
            let metrics = self.metrics.clone();
            let name = self.name.clone();
            let interval = self.config.flush_interval;
            thread::spawn(move || {
                let done = cancel.done();
                let ticker = tick(interval);
                tracing::debug!(stage = %name, ?interval, "flush task started");
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if !forward_batch(&buffer, &tx, &done, &metrics) {
                                break;
                            }
                        }
                        recv(ingest_closed) -> _ => {
                            // End of input: emit whatever is still buffered
                            // instead of waiting out the interval.
                            if !cancel.is_raised() {
                                forward_batch(&buffer, &tx, &done, &metrics);
                            }
                            break;
                        }
                        recv(done) -> _ => break,
                    }
                }
                tracing::debug!(stage = %name, "flush task exiting");
            })
        };

        SpawnedStage {
            output: rx,
            handles: vec![ingest, flush],
        }
    }
}

/// Drain the buffer and forward the batch in order, each send racing
/// cancellation. Returns false when the stage should stop. An empty batch
/// is a no-op.
fn forward_batch(
    buffer: &RingBuffer,
    out: &Sender<i64>,
    done: &Receiver<()>,
    metrics: &StageMetrics,
) -> bool {
    let batch = buffer.drain();
    if batch.is_empty() {
        return true;
    }
    tracing::trace!(len = batch.len(), "forwarding batch");
    for value in batch {
        select! {
            send(out, value) -> res => {
                if res.is_err() {
                    return false; // downstream gone
                }
                metrics.record_forwarded();
            }
            recv(done) -> _ => return false,
        }
    }
    true
}

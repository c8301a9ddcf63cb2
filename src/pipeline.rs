use crate::cancel::CancelSignal;
use crate::error::{PipelineError, Result};
use crate::stage::Stage;
use crossbeam::channel::Receiver;
use std::thread::JoinHandle;

/// Builder for assembling pipelines stage by stage
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage to the pipeline
    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Build the pipeline around a shared cancellation signal
    pub fn build(self, cancel: CancelSignal) -> Result<Pipeline> {
        Pipeline::compose(cancel, self.stages)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered composition of stages sharing one cancellation signal
///
/// Immutable once composed; [`Pipeline::start`] consumes it, wiring each
/// stage's output to the next stage's input. Composition is purely
/// structural and buffers nothing of its own, so pipeline latency is the
/// sum of the individual stages' latencies.
pub struct Pipeline {
    cancel: CancelSignal,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Compose a pipeline from stages in execution order
    pub fn compose(cancel: CancelSignal, stages: Vec<Box<dyn Stage>>) -> Result<Self> {
        if stages.is_empty() {
            return Err(PipelineError::NoStages);
        }
        Ok(Self { cancel, stages })
    }

    /// Feed `source` into the first stage and start every stage's tasks
    pub fn start(self, source: Receiver<i64>) -> RunningPipeline {
        let mut handles = Vec::new();
        let mut conduit = source;
        for stage in self.stages {
            tracing::debug!(stage = stage.name(), "wiring stage");
            let spawned = stage.spawn(self.cancel.clone(), conduit);
            conduit = spawned.output;
            handles.extend(spawned.handles);
        }
        RunningPipeline {
            output: conduit,
            handles,
            cancel: self.cancel,
        }
    }
}

/// A started pipeline: the final output conduit plus every stage task
pub struct RunningPipeline {
    output: Receiver<i64>,
    handles: Vec<JoinHandle<()>>,
    cancel: CancelSignal,
}

impl RunningPipeline {
    /// The last stage's output conduit
    pub fn output(&self) -> Receiver<i64> {
        self.output.clone()
    }

    /// Raise the shared cancellation signal, then join every stage task
    pub fn shutdown(self) -> Result<()> {
        self.cancel.raise();
        self.join_all()
    }

    /// Join every stage task without raising cancellation
    ///
    /// Returns once all tasks have exited, i.e. after cancellation has been
    /// raised elsewhere or every conduit has drained and closed.
    pub fn wait(self) -> Result<()> {
        self.join_all()
    }

    fn join_all(self) -> Result<()> {
        for handle in self.handles {
            handle
                .join()
                .map_err(|_| PipelineError::Thread("stage task panicked".into()))?;
        }
        Ok(())
    }
}

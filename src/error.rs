use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while assembling or tearing down a pipeline
///
/// Running stages never produce errors: filtering, buffering and forwarding
/// are total operations, and cancellation is normal termination rather than
/// a failure. Everything here is reported either before the pipeline starts
/// or when joining its tasks.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No stages in pipeline
    #[error("cannot compose a pipeline with no stages")]
    NoStages,

    /// Invalid startup configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A stage task panicked and was discovered at join time
    #[error("stage task failed: {0}")]
    Thread(String),
}

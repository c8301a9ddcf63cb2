//! A channel-based stream pipeline that filters and batches integer data.
//!
//! This crate provides a composable pipeline of independently running
//! stages connected by zero-capacity rendezvous channels, with a shared
//! one-shot cancellation signal that halts every stage in bounded time.
//!
//! # Features
//!
//! - Stages as threads connected by synchronous crossbeam conduits
//! - Every blocking receive and send races the cancellation signal
//! - Fixed-capacity ring buffer with oldest-first eviction and atomic drain
//! - Buffering stage that decouples arrival rate from a timed emission rate
//! - Per-stage received/forwarded counters
//! - Builder pattern for pipeline construction
//!
//! # Example
//!
//! ```ignore
//! use numstream::{BufferConfig, BufferStage, CancelSignal, FilterStage, PipelineBuilder};
//!
//! let cancel = CancelSignal::new();
//! let pipeline = PipelineBuilder::new()
//!     .stage(FilterStage::positive())
//!     .stage(FilterStage::multiple_of_three())
//!     .stage(BufferStage::new(BufferConfig::default())?)
//!     .build(cancel.clone())?;
//!
//! let running = pipeline.start(source);
//! // ... drain running.output() until cancel is raised ...
//! running.wait()?;
//! ```

pub mod buffer;
pub mod buffered;
pub mod cancel;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod stage;

// Re-exports for convenience
pub use buffer::RingBuffer;
pub use buffered::{BufferConfig, BufferStage};
pub use cancel::CancelSignal;
pub use error::{PipelineError, Result};
pub use metrics::{MetricsSnapshot, StageMetrics};
pub use pipeline::{Pipeline, PipelineBuilder, RunningPipeline};
pub use stage::{FilterStage, SpawnedStage, Stage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
